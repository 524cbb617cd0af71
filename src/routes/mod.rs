pub mod vote_route;

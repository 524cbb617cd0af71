pub mod vote_controller;

pub mod ballot_ledger;
pub mod vote_store;

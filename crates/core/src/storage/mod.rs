pub mod snapshots;
pub mod watchlist;

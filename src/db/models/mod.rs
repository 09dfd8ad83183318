pub mod duck;
pub mod key;
pub mod leaderboard;

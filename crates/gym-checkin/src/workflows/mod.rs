pub mod checkin;
pub mod membership;

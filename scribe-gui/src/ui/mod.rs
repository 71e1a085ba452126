pub mod main_display;
pub mod score_staff;

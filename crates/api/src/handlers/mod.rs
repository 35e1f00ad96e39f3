pub mod animation;
pub mod jobs;
pub mod story;

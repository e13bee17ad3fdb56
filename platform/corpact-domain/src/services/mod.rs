pub mod marker_tracker;

pub mod family_tree;
pub mod person_details;
pub mod search_panel;

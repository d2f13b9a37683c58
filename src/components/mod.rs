pub mod client_picker;
pub mod line_items;
pub mod modal;
pub mod records_table;
pub mod ui;

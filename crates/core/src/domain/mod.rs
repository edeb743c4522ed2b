pub mod calculation;
pub mod modifier;
pub mod price_list;

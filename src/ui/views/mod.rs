mod entity_list;

pub use entity_list::EntityListView;

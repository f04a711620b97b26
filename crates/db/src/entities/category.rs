use crate::descriptor::{DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD};
use crate::module::Module;
use crate::store::StoreHandle;

pub static CATEGORY: EntityDescriptor = EntityDescriptor {
    name: "category",
    table: "categories",
    fields: &[
        FieldDef::int("id"),
        FieldDef::text("title"),
        FieldDef::text("description"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &[],
    defaults: &[("createdAt", DefaultValue::Now)],
    computed: &[],
    rewrite_filter: None,
};

pub struct CategoryRepo;

impl CategoryRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&CATEGORY, store.clone())
    }
}

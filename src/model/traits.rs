use crate::types::links::JsonMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

pub trait StructFieldNames {
    fn field_names() -> &'static [&'static str];
}

pub trait Model: Serialize + DeserializeOwned + Default + Clone + StructFieldNames + Into<JsonMap> {
    type Id: PartialEq + Display;

    fn id(&self) -> Self::Id;

    // fields stripped before a record leaves the service
    fn private_fields() -> &'static [&'static str] {
        &[]
    }

    fn public_map(self) -> JsonMap {
        let mut mp: JsonMap = self.into();
        for f in Self::private_fields() {
            mp.remove(*f);
        }
        mp
    }

    fn has_field(name: &str) -> bool {
        Self::field_names().contains(&name)
    }
}

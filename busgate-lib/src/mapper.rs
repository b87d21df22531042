use std::sync::Arc;

use busgate_common::{
    mapper_path, mapper_service, value::BusValue, Error, Result, MAPPER_INTERFACE,
};

use crate::client::{BusClient, MethodCall};

/// Owners of a single object path: connection name to interface list.
pub type ObjectOwners = Vec<(String, Vec<String>)>;

/// A subtree: object path to its owners.
pub type SubTree = Vec<(String, ObjectOwners)>;

/// Client side of the object-mapper service.
#[derive(Clone)]
pub struct Mapper {
    bus: Arc<dyn BusClient>,
}

impl Mapper {
    pub fn new(bus: Arc<dyn BusClient>) -> Self {
        Self { bus }
    }

    /// Connections owning `path`, with the interfaces each implements.
    pub async fn get_object(&self, path: &str) -> Result<ObjectOwners> {
        let reply = self.call(Self::mapper_call("GetObject", path, None)).await?;

        Self::owners(Self::first(&reply, "GetObject")?).ok_or_else(|| Self::bad_reply("GetObject"))
    }

    /// Subtree below `path` down to `depth`, with owners per object.
    pub async fn get_sub_tree(&self, path: &str, depth: i32) -> Result<SubTree> {
        let reply = self
            .call(Self::mapper_call("GetSubTree", path, Some(depth)))
            .await?;

        let BusValue::Array { items, .. } = Self::first(&reply, "GetSubTree")? else {
            return Err(Self::bad_reply("GetSubTree"));
        };

        let mut sub_tree = Vec::new();
        for item in items {
            let BusValue::DictEntry(key, value) = item else {
                return Err(Self::bad_reply("GetSubTree"));
            };
            let path = key.as_str().ok_or_else(|| Self::bad_reply("GetSubTree"))?;
            let owners = Self::owners(value).ok_or_else(|| Self::bad_reply("GetSubTree"))?;

            sub_tree.push((path.to_owned(), owners));
        }

        Ok(sub_tree)
    }

    /// Just the object paths below `path` down to `depth`.
    pub async fn get_sub_tree_paths(&self, path: &str, depth: i32) -> Result<Vec<String>> {
        let reply = self
            .call(Self::mapper_call("GetSubTreePaths", path, Some(depth)))
            .await?;

        Self::string_list(Self::first(&reply, "GetSubTreePaths")?)
            .ok_or_else(|| Self::bad_reply("GetSubTreePaths"))
    }

    async fn call(&self, call: MethodCall) -> Result<Vec<BusValue>> {
        self.bus
            .method_call(call)
            .await
            .map_err(|e| Error::Resolver(e.to_string()))
    }

    // Every mapper method takes (path, [depth,] interface filter); the
    // filter stays empty here
    fn mapper_call(member: &str, path: &str, depth: Option<i32>) -> MethodCall {
        let mut call = MethodCall::new(&mapper_service(), &mapper_path(), MAPPER_INTERFACE, member)
            .arg(BusValue::Str(path.to_owned()));

        if let Some(depth) = depth {
            call = call.arg(BusValue::I32(depth));
        }

        call.arg(BusValue::Array {
            signature: "s".into(),
            items: Vec::new(),
        })
    }

    fn first<'a>(reply: &'a [BusValue], member: &str) -> Result<&'a BusValue> {
        reply.first().ok_or_else(|| Self::bad_reply(member))
    }

    fn owners(value: &BusValue) -> Option<ObjectOwners> {
        let BusValue::Array { items, .. } = value else {
            return None;
        };

        let mut owners = Vec::new();
        for item in items {
            let BusValue::DictEntry(key, value) = item else {
                return None;
            };

            owners.push((key.as_str()?.to_owned(), Self::string_list(value)?));
        }

        Some(owners)
    }

    fn string_list(value: &BusValue) -> Option<Vec<String>> {
        let BusValue::Array { items, .. } = value else {
            return None;
        };

        items
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect()
    }

    fn bad_reply(member: &str) -> Error {
        Error::Resolver(format!("unexpected {member} reply shape"))
    }
}

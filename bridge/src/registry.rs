// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;

use actor_bridge_runtime::{ActorCode, MethodTable, Runtime};
use actor_bridge_shared::builtin::Type;
use actor_bridge_shared::version::ActorsVersion;
use cid::Cid;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("actor code {0} is already registered")]
    Duplicate(Cid),
}

/// Maps actor code ids to their method tables. Distinct code ids never share a table.
pub struct Registry<RT> {
    actors: HashMap<Cid, MethodTable<RT>>,
}

impl<RT: Runtime + 'static> Default for Registry<RT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RT: Runtime + 'static> Registry<RT> {
    pub fn new() -> Self {
        Registry {
            actors: HashMap::new(),
        }
    }

    /// Registers the methods of `A` under `code`.
    pub fn register<A: ActorCode>(&mut self, code: Cid) -> Result<(), RegistryError> {
        if self.actors.contains_key(&code) {
            return Err(RegistryError::Duplicate(code));
        }
        self.actors.insert(code, A::exports::<RT>().build());
        Ok(())
    }

    /// Registers the methods of `A` under the code ids of the builtin `kind` in each of the
    /// given generations.
    pub fn register_builtin<A: ActorCode>(
        &mut self,
        kind: Type,
        versions: &[ActorsVersion],
    ) -> Result<(), RegistryError> {
        for version in versions {
            self.register::<A>(kind.code_id(*version))?;
        }
        Ok(())
    }

    pub fn get(&self, code: &Cid) -> Option<&MethodTable<RT>> {
        self.actors.get(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &Cid> {
        self.actors.keys()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

//! Lookup of type definitions by external standard identifier.

use crate::error::{CaseError, CaseResult};
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::TypeDef;

pub const TEST_CASE_ID: &str = "repository-type-external-mappings";
pub const TEST_CASE_NAME: &str = "Repository type definition external standard mappings";

#[derive(Debug, Clone)]
pub struct ExternalMappingsCase {
    type_defs: Vec<TypeDef>,
}

impl ExternalMappingsCase {
    pub fn new(type_defs: Vec<TypeDef>) -> Self {
        Self { type_defs }
    }

    fn mapped(&self) -> impl Iterator<Item = &TypeDef> {
        self.type_defs
            .iter()
            .filter(|d| !d.external_standard_mappings.is_empty())
    }
}

#[async_trait]
impl ConformanceTestCase for ExternalMappingsCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn success_message(&self) -> String {
        format!(
            "{} mapped type definitions are retrievable by external identifier",
            self.mapped().count()
        )
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<()> {
        let mapped: Vec<&TypeDef> = self.mapped().collect();
        if mapped.is_empty() {
            return Err(CaseError::not_applicable(
                "no discovered type definition declares an external standard mapping",
            ));
        }

        let repo = ctx.collection();
        let mut names = Vec::with_capacity(mapped.len());

        for def in mapped {
            let name = ctx.require(
                def.name.clone(),
                "mapped-type-name-present",
                "Mapped TypeDef has a name",
            )?;
            let guid = ctx.require(
                def.guid.clone(),
                "mapped-type-guid-present",
                format!("Mapped TypeDef {} has a GUID", name),
            )?;

            for mapping in &def.external_standard_mappings {
                let found = ctx
                    .call(
                        "findTypeDefsByExternalID",
                        repo.find_type_defs_by_external_id(
                            mapping.standard_name.as_deref(),
                            mapping.standard_organization.as_deref(),
                            mapping.standard_type_name.as_deref(),
                        ),
                    )
                    .await?;
                ctx.assert(
                    found.iter().any(|f| f.guid.as_deref() == Some(guid.as_str())),
                    "external-mapping-resolves",
                    format!(
                        "TypeDef {} is found by external identifier {}/{}/{}",
                        name,
                        mapping.standard_organization.as_deref().unwrap_or("-"),
                        mapping.standard_name.as_deref().unwrap_or("-"),
                        mapping.standard_type_name.as_deref().unwrap_or("-"),
                    ),
                )?;
            }

            names.push(name);
        }

        ctx.discover("Externally mapped TypeDefs", names);
        Ok(())
    }
}

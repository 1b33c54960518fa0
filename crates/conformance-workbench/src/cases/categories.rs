//! Category partition cross-checks.
//!
//! Each category is fetched with the repository's find-by-category operation
//! and compared with the complete list retrieved during discovery. Every
//! discovered type must land in exactly one category.

use super::name_or_null;
use crate::error::CaseResult;
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::{AttributeTypeDef, AttributeTypeDefCategory, TypeDef, TypeDefCategory};
use std::fmt::Display;
use std::future::Future;

pub const ATTRIBUTE_TEST_CASE_ID: &str = "repository-attribute-type-definition-categories";
pub const ATTRIBUTE_TEST_CASE_NAME: &str = "Repository attribute type definition categories";

pub const TYPE_TEST_CASE_ID: &str = "repository-type-definition-categories";
pub const TYPE_TEST_CASE_NAME: &str = "Repository type definition categories";

/// A definition that belongs to exactly one category.
trait Categorized: PartialEq + Send + Sync {
    type Category: Copy + PartialEq + Display + Send + Sync;

    fn category(&self) -> Option<Self::Category>;
    fn guid(&self) -> Option<&String>;
    fn name(&self) -> Option<&String>;
    fn discovery_key(category: Self::Category) -> &'static str;
}

impl Categorized for AttributeTypeDef {
    type Category = AttributeTypeDefCategory;

    fn category(&self) -> Option<AttributeTypeDefCategory> {
        self.category
    }

    fn guid(&self) -> Option<&String> {
        self.guid.as_ref()
    }

    fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    fn discovery_key(category: AttributeTypeDefCategory) -> &'static str {
        category.discovery_key()
    }
}

impl Categorized for TypeDef {
    type Category = TypeDefCategory;

    fn category(&self) -> Option<TypeDefCategory> {
        self.category
    }

    fn guid(&self) -> Option<&String> {
        self.guid.as_ref()
    }

    fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    fn discovery_key(category: TypeDefCategory) -> &'static str {
        category.discovery_key()
    }
}

/// Guid when both sides carry one, then name, then the whole definition.
fn same_definition<D: Categorized>(found: &D, discovered: &D) -> bool {
    match (found.guid(), discovered.guid()) {
        (Some(a), Some(b)) => a == b,
        _ => match (found.name(), discovered.name()) {
            (Some(a), Some(b)) => a == b,
            _ => found == discovered,
        },
    }
}

/// Fetch every known category through `find` and check the results against
/// the discovered list `all`.
async fn check_partition<D, F, Fut>(
    ctx: &mut CaseContext,
    all: &[D],
    known: &[D::Category],
    operation: &'static str,
    label: &str,
    find: F,
) -> CaseResult<()>
where
    D: Categorized,
    F: Fn(D::Category) -> Fut + Send + Sync,
    Fut: Future<Output = conformance_core::Result<Vec<D>>> + Send,
{
    let mut listed: Vec<D> = Vec::new();

    for &category in known {
        let found = ctx.call(operation, find(category)).await?;

        let names: Vec<String> = found.iter().map(|d| name_or_null(d.name())).collect();
        ctx.discover(D::discovery_key(category), names);

        ctx.assert(
            found.iter().all(|d| d.category() == Some(category)),
            &format!("{}-results-in-category", category),
            format!("Every {} result carries category {}", category, category),
        )?;

        let expected = all.iter().filter(|d| d.category() == Some(category)).count();
        ctx.assert(
            found.len() == expected,
            &format!("{}-count-matches", category),
            format!(
                "{} returned {} definitions, discovery listed {}",
                D::discovery_key(category),
                found.len(),
                expected
            ),
        )?;

        listed.extend(found);
    }

    let covered = all
        .iter()
        .filter(|d| listed.iter().any(|f| same_definition(f, *d)))
        .count();
    ctx.assert(
        covered == all.len(),
        "partition-complete",
        format!(
            "{} of {} discovered {} were listed under a category",
            covered,
            all.len(),
            label
        ),
    )?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct AttributeTypeDefCategoriesCase {
    all: Vec<AttributeTypeDef>,
}

impl AttributeTypeDefCategoriesCase {
    pub fn new(all: Vec<AttributeTypeDef>) -> Self {
        Self { all }
    }
}

#[async_trait]
impl ConformanceTestCase for AttributeTypeDefCategoriesCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        ATTRIBUTE_TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        ATTRIBUTE_TEST_CASE_NAME
    }

    fn success_message(&self) -> String {
        format!(
            "All {} attribute type definitions are partitioned by category",
            self.all.len()
        )
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<()> {
        let collection = ctx.collection();
        let repo = collection.as_ref();
        check_partition(
            ctx,
            &self.all,
            &AttributeTypeDefCategory::KNOWN,
            "findAttributeTypeDefsByCategory",
            "attribute type definitions",
            move |category| repo.find_attribute_type_defs_by_category(category),
        )
        .await
    }
}

#[derive(Debug, Clone)]
pub struct TypeDefCategoriesCase {
    all: Vec<TypeDef>,
}

impl TypeDefCategoriesCase {
    pub fn new(all: Vec<TypeDef>) -> Self {
        Self { all }
    }
}

#[async_trait]
impl ConformanceTestCase for TypeDefCategoriesCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        TYPE_TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TYPE_TEST_CASE_NAME
    }

    fn success_message(&self) -> String {
        format!(
            "All {} type definitions are partitioned by category",
            self.all.len()
        )
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<()> {
        let collection = ctx.collection();
        let repo = collection.as_ref();
        check_partition(
            ctx,
            &self.all,
            &TypeDefCategory::KNOWN,
            "findTypeDefsByCategory",
            "type definitions",
            move |category| repo.find_type_defs_by_category(category),
        )
        .await
    }
}

use super::field::{FieldDef, FieldKind};
use super::registry::SchemaRegistry;
use super::ResourceSchema;
use crate::error::Result;
use crate::query::SortKey;

/// Builds the schemas of the dashboard's lookup lists.
fn lookup_schemas() -> Result<Vec<ResourceSchema>> {
    Ok(vec![
        ResourceSchema::new("rooms")
            .with_field(FieldDef::new("name", FieldKind::Text))?
            .ordered_by(vec![SortKey::asc("name")]),
        ResourceSchema::new("item-ratings")
            .with_field(FieldDef::new("name", FieldKind::Text))?
            .with_field(FieldDef::new("description", FieldKind::Text))?,
        ResourceSchema::new("product-types")
            .with_field(FieldDef::new("name", FieldKind::Text))?
            .with_field(FieldDef::new("description", FieldKind::Text))?,
    ])
}

/// Builds the schemas of the party records (people, sellers, addresses).
fn party_schemas() -> Result<Vec<ResourceSchema>> {
    Ok(vec![
        ResourceSchema::new("addresses")
            .with_field(FieldDef::new("street", FieldKind::Text))?
            .with_field(FieldDef::new("city", FieldKind::Text))?
            .with_field(FieldDef::new("postcode", FieldKind::Text))?
            .with_field(FieldDef::new("country", FieldKind::Text))?,
        ResourceSchema::new("persons")
            .with_field(FieldDef::new("name", FieldKind::Text))?
            .with_field(FieldDef::new("email", FieldKind::Text))?
            .with_field(FieldDef::new("phone", FieldKind::Text))?
            .with_field(FieldDef::new(
                "address",
                FieldKind::relation("addresses", "street"),
            ))?,
        ResourceSchema::new("sellers")
            .with_field(FieldDef::new("name", FieldKind::Text))?
            .with_field(FieldDef::new("website", FieldKind::Text))?
            .with_field(FieldDef::new(
                "address",
                FieldKind::relation("addresses", "street"),
            ))?,
    ])
}

/// Builds the schemas of the inventory, purchasing and selling tables.
fn stock_schemas() -> Result<Vec<ResourceSchema>> {
    Ok(vec![
        ResourceSchema::new("products")
            .with_field(FieldDef::new("sku", FieldKind::Text).label("SKU"))?
            .with_field(FieldDef::new("name", FieldKind::Text))?
            .with_field(FieldDef::new(
                "product_type",
                FieldKind::relation("product-types", "name"),
            ))?,
        ResourceSchema::new("identifiers")
            .with_field(FieldDef::new("code", FieldKind::Text))?
            .with_field(FieldDef::new("product", FieldKind::relation("products", "sku")))?,
        ResourceSchema::new("inventory")
            .with_field(FieldDef::new("serial", FieldKind::Text))?
            .with_field(FieldDef::new("total_cost", FieldKind::Decimal).label("Total cost"))?
            .with_field(FieldDef::new("room", FieldKind::relation("rooms", "name")))?
            .with_field(FieldDef::new(
                "rating",
                FieldKind::relation("item-ratings", "name"),
            ))?
            .with_field(
                FieldDef::new("product.sku", FieldKind::Text)
                    .read_only()
                    .label("SKU"),
            )?
            .with_field(FieldDef::new("product.name", FieldKind::Text).read_only())?
            .with_field(FieldDef::new("received", FieldKind::Date))?
            .with_field(FieldDef::new("sold", FieldKind::Boolean))?
            .ordered_by(vec![SortKey::desc("received"), SortKey::asc("serial")]),
        ResourceSchema::new("aging-summary")
            .with_field(FieldDef::new("room", FieldKind::relation("rooms", "name")))?
            .with_field(FieldDef::new("age_days", FieldKind::Integer).read_only())?
            .with_field(FieldDef::new("count", FieldKind::Integer).read_only())?
            .with_field(FieldDef::new("note", FieldKind::Text))?,
        ResourceSchema::new("purchases")
            .with_field(FieldDef::new("seller", FieldKind::relation("sellers", "name")))?
            .with_field(FieldDef::new("date", FieldKind::Date))?
            .with_field(FieldDef::new("buying", FieldKind::Decimal).read_only())?
            .with_field(FieldDef::new("paid", FieldKind::Boolean))?
            .with_field(FieldDef::new("note", FieldKind::Text))?
            .ordered_by(vec![SortKey::desc("date")]),
        ResourceSchema::new("sales")
            .with_field(FieldDef::new("person", FieldKind::relation("persons", "name")))?
            .with_field(FieldDef::new("date", FieldKind::Date))?
            .with_field(FieldDef::new("selling", FieldKind::Decimal).read_only())?
            .with_field(FieldDef::new("shipped", FieldKind::Boolean))?
            .ordered_by(vec![SortKey::desc("date")]),
    ])
}

/// Registers every resource shown by the dashboard.
///
/// # Returns
/// `Err` if any of the resources is already registered.
pub fn register_builtin_schemas(registry: &SchemaRegistry) -> Result<()> {
    for schema in lookup_schemas()?
        .into_iter()
        .chain(party_schemas()?)
        .chain(stock_schemas()?)
    {
        registry.register(schema)?;
    }
    Ok(())
}

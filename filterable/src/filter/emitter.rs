//! Predicate emission
//!
//! Turns one resolved `(type, name, operator, value)` tuple into calls on a
//! [`QueryBuilder`]. Rows are checked in order: relation hop, `in`, null
//! check, then the per-type dispatch.

use crate::utils::string::accessor_name;

use super::builder::{Conjunction, QueryBuilder, SubQuery};
use super::coerce::{is_date_only, loose_bool, to_list};
use super::engine::RelationshipScope;
use super::error::FilterError;
use super::name::FilterName;
use super::types::{Operator, SemanticType, Value};

pub(crate) fn emit<Q: QueryBuilder>(
    query: &mut Q,
    semantic_type: SemanticType,
    name: &FilterName,
    op: Operator,
    value: &Value,
    relationship_scope: Option<RelationshipScope<'_, Q>>,
) -> Result<(), FilterError> {
    let Some(relation) = &name.relation else {
        return emit_local(query, semantic_type, name, op, value, relationship_scope);
    };

    let relation = accessor_name(relation);
    let local = name.without_relation();
    tracing::trace!(relation = %relation, field = %local, operator = %op, "Emitting where_has");

    // the scope constrains the hop only, never a count nested under it
    query.where_has(&relation, &mut |sub: &mut Q| {
        if let Some(scope) = relationship_scope {
            scope(sub)?;
        }
        emit_local(sub, semantic_type, &local, op, value, None)
    })
}

fn emit_local<Q: QueryBuilder>(
    query: &mut Q,
    semantic_type: SemanticType,
    name: &FilterName,
    op: Operator,
    value: &Value,
    relationship_scope: Option<RelationshipScope<'_, Q>>,
) -> Result<(), FilterError> {
    let field = name.target();

    if op == Operator::In {
        let values = to_list(value);
        tracing::trace!(field = %field, count = values.len(), "Emitting in");
        if semantic_type != SemanticType::Array {
            query.where_in(&field, &values);
            return Ok(());
        }
        return match values.as_slice() {
            [single] => {
                query.where_json_contains(&field, &trimmed(single));
                Ok(())
            }
            many => query.where_group(Conjunction::Or, &mut |group: &mut Q| {
                for item in many {
                    group.where_json_contains(&field, &trimmed(item));
                }
                Ok(())
            }),
        };
    }

    if op.is_null_check() && value.is_null_token() {
        tracing::trace!(field = %field, operator = %op, "Emitting null check");
        if op == Operator::Is {
            query.where_null(&field);
        } else {
            query.where_not_null(&field);
        }
        return Ok(());
    }

    let op = op.comparison();
    tracing::trace!(field = %field, operator = %op, semantic_type = %semantic_type, "Emitting predicate");

    match semantic_type {
        SemanticType::Id
        | SemanticType::Integer
        | SemanticType::Float
        | SemanticType::String
        | SemanticType::Json
        | SemanticType::Array => query.where_cmp(&field, op, value),
        SemanticType::Boolean => query.where_cmp(&field, op, &Value::Bool(loose_bool(value))),
        SemanticType::Date => query.where_date(&field, op, value),
        SemanticType::DateTime if is_date_only(value) => query.where_date(&field, op, value),
        SemanticType::DateTime => query.where_cmp(&field, op, value),
        SemanticType::Relationship => {
            let relation = accessor_name(&name.column);
            return match relationship_scope {
                Some(scope) => {
                    let constraint: SubQuery<'_, Q> = &mut |sub: &mut Q| scope(sub);
                    query.has(&relation, op, value, Some(constraint))
                }
                None => query.has(&relation, op, value, None),
            };
        }
        SemanticType::Scope => {
            return Err(FilterError::UnsupportedFilterType(
                semantic_type.to_string(),
            ));
        }
    }

    Ok(())
}

/// Trim text items of an `in` list bound for JSON containment
fn trimmed(value: &Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(s.trim().to_string()),
        other => other.clone(),
    }
}

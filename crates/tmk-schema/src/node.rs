//! # Schema Node View
//!
//! A typed, read-only view over the subset of JSON Schema that the
//! normalizer and scorer care about: `type`, `properties`, `items`, `enum`,
//! and `required`. Everything else in the schema is left to the
//! conformance checker.
//!
//! Local references (`#/$defs/...`, `#/definitions/...`) are followed while
//! building the view so nested objects behind a `$ref` are still repaired.
//! A reference that is external, dangling, or already being expanded
//! (a recursive schema) is treated as opaque.

use serde_json::Value;

/// The closed set of `type` values the normalizer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// `"type": "object"`
    Object,
    /// `"type": "array"`
    Array,
    /// `"type": "string"`
    String,
    /// Any other `type`, including type unions such as `["string", "null"]`.
    Other,
    /// No `type` keyword.
    Untyped,
}

impl NodeType {
    fn from_schema(value: &Value) -> Self {
        match value.get("type") {
            None => Self::Untyped,
            Some(Value::String(t)) => match t.as_str() {
                "object" => Self::Object,
                "array" => Self::Array,
                "string" => Self::String,
                _ => Self::Other,
            },
            Some(_) => Self::Other,
        }
    }
}

/// A declared property: its canonical name and its schema.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    node: SchemaNode,
}

impl Property {
    /// Canonical (schema-declared) spelling of the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema governing the property's value.
    pub fn node(&self) -> &SchemaNode {
        &self.node
    }
}

/// Structural view of one schema level.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    node_type: NodeType,
    properties: Vec<Property>,
    items: Option<Box<SchemaNode>>,
    enum_values: Option<Vec<String>>,
    required: Vec<String>,
    raw: Value,
}

impl SchemaNode {
    /// Build the view for a root schema document.
    ///
    /// Never fails: keywords with unexpected shapes are treated as absent.
    pub fn parse(root: &Value) -> Self {
        let mut expanding = Vec::new();
        Self::build(root, root, &mut expanding)
    }

    fn build(value: &Value, root: &Value, expanding: &mut Vec<String>) -> Self {
        if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
            if !expanding.iter().any(|r| r == reference) {
                if let Some(target) = resolve_local_ref(root, reference) {
                    expanding.push(reference.to_string());
                    let mut node = Self::build(target, root, expanding);
                    expanding.pop();
                    node.raw = value.clone();
                    return node;
                }
            }
        }

        let properties = value
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, def)| Property {
                        name: name.clone(),
                        node: Self::build(def, root, expanding),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let items = value
            .get("items")
            .filter(|items| items.is_object())
            .map(|items| Box::new(Self::build(items, root, expanding)));

        let enum_values = value.get("enum").and_then(Value::as_array).map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        });

        let required = value
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            node_type: NodeType::from_schema(value),
            properties,
            items,
            enum_values,
            required,
            raw: value.clone(),
        }
    }

    /// The node's declared type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Declared properties in schema order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Look up a declared property by its exact name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.node)
    }

    /// Schema for array elements, when declared as a single schema.
    pub fn items(&self) -> Option<&SchemaNode> {
        self.items.as_deref()
    }

    /// String members of `enum`, in declared order. `None` when the node has
    /// no `enum` keyword.
    pub fn enum_values(&self) -> Option<&[String]> {
        self.enum_values.as_deref()
    }

    /// Names listed in `required`, in declared order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Whether `name` is listed in `required`.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// The schema JSON this node was built from. For a `$ref` node this is
    /// the reference itself, not its target.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

fn resolve_local_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    root.pointer(pointer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_core_keywords() {
        let schema = json!({
            "type": "object",
            "properties": {
                "model": { "type": "string", "enum": ["Task", 3, "Method"] },
                "steps": { "type": "array", "items": { "type": "object" } },
                "count": { "type": "integer" }
            },
            "required": ["model"]
        });
        let node = SchemaNode::parse(&schema);

        assert_eq!(node.node_type(), NodeType::Object);
        let names: Vec<&str> = node.properties().iter().map(Property::name).collect();
        assert_eq!(names, ["model", "steps", "count"]);

        let model = node.property("model").unwrap();
        assert_eq!(model.node_type(), NodeType::String);
        assert_eq!(model.enum_values().unwrap(), ["Task", "Method"]);

        let steps = node.property("steps").unwrap();
        assert_eq!(steps.items().unwrap().node_type(), NodeType::Object);

        assert_eq!(node.property("count").unwrap().node_type(), NodeType::Other);
        assert!(node.is_required("model"));
        assert!(!node.is_required("steps"));
    }

    #[test]
    fn missing_keywords_degrade_to_absent() {
        let node = SchemaNode::parse(&json!({ "properties": 5, "required": "model" }));
        assert_eq!(node.node_type(), NodeType::Untyped);
        assert!(node.properties().is_empty());
        assert!(node.required().is_empty());
        assert!(node.enum_values().is_none());
        assert!(node.items().is_none());
    }

    #[test]
    fn type_union_is_other() {
        let node = SchemaNode::parse(&json!({ "type": ["object", "null"] }));
        assert_eq!(node.node_type(), NodeType::Other);
    }

    #[test]
    fn follows_local_refs() {
        let schema = json!({
            "type": "object",
            "properties": {
                "inputs": { "type": "array", "items": { "$ref": "#/$defs/param" } }
            },
            "$defs": {
                "param": {
                    "type": "object",
                    "properties": { "kind": { "enum": ["Value"] } }
                }
            }
        });
        let node = SchemaNode::parse(&schema);
        let item = node.property("inputs").unwrap().items().unwrap();
        assert_eq!(item.node_type(), NodeType::Object);
        assert_eq!(item.raw(), &json!({ "$ref": "#/$defs/param" }));
        assert_eq!(
            item.property("kind").unwrap().enum_values().unwrap(),
            ["Value"]
        );
    }

    #[test]
    fn recursive_refs_terminate() {
        let schema = json!({
            "$ref": "#/$defs/tree",
            "$defs": {
                "tree": {
                    "type": "object",
                    "properties": {
                        "children": { "type": "array", "items": { "$ref": "#/$defs/tree" } }
                    }
                }
            }
        });
        let node = SchemaNode::parse(&schema);
        let child = node.property("children").unwrap().items().unwrap();
        // The inner reference is already being expanded, so it stays opaque.
        assert_eq!(child.node_type(), NodeType::Untyped);
        assert!(child.properties().is_empty());
    }

    #[test]
    fn dangling_ref_is_opaque() {
        let node = SchemaNode::parse(&json!({ "$ref": "#/$defs/missing", "type": "string" }));
        assert_eq!(node.node_type(), NodeType::String);
    }
}

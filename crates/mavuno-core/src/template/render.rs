use std::borrow::Cow;

use serde_json::Value;

use super::Node;

/// Resolution scope: the root context plus the current `#each` item.
struct Scope<'a> {
    root: &'a Value,
    item: Option<(&'a Value, usize)>,
}

impl<'a> Scope<'a> {
    fn current(&self) -> &'a Value {
        self.item.map_or(self.root, |(item, _)| item)
    }

    fn resolve(&self, path: &str) -> Option<Cow<'a, Value>> {
        match path {
            "@index" => self.item.map(|(_, index)| Cow::Owned(Value::from(index))),
            "this" | "." => Some(Cow::Borrowed(self.current())),
            _ => {
                if let Some(rest) = path.strip_prefix("this.") {
                    return lookup(self.current(), rest).map(Cow::Borrowed);
                }
                if let Some((item, _)) = self.item
                    && let Some(found) = lookup(item, path)
                {
                    return Some(Cow::Borrowed(found));
                }
                lookup(self.root, path).map(Cow::Borrowed)
            }
        }
    }
}

pub(super) fn render(nodes: &[Node], context: &Value) -> String {
    let mut out = String::new();
    let scope = Scope {
        root: context,
        item: None,
    };
    render_into(&mut out, nodes, &scope);
    out
}

fn render_into(out: &mut String, nodes: &[Node], scope: &Scope<'_>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(path) => write_value(out, scope.resolve(path).as_deref()),
            Node::Each { path, body } => {
                let list = scope.resolve(path);
                if let Some(Value::Array(items)) = list.as_deref() {
                    for (index, item) in items.iter().enumerate() {
                        let inner = Scope {
                            root: scope.root,
                            item: Some((item, index)),
                        };
                        render_into(out, body, &inner);
                    }
                }
            }
            Node::If {
                path,
                literal,
                then,
                otherwise,
            } => {
                let matched = scope
                    .resolve(path)
                    .as_deref()
                    .is_some_and(|actual| literal_eq(actual, literal));
                render_into(out, if matched { then } else { otherwise }, scope);
            }
        }
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn literal_eq(actual: &Value, literal: &Value) -> bool {
    match (actual, literal) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == literal,
    }
}

fn write_value(out: &mut String, value: Option<&Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => out.push_str(s),
        Some(Value::Array(items)) if items.iter().all(is_scalar) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, Some(item));
            }
        }
        Some(other) => out.push_str(&other.to_string()),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::Template;

    fn render(source: &str, context: serde_json::Value) -> String {
        Template::parse(source).unwrap().render(&context)
    }

    #[test]
    fn missing_fields_render_empty() {
        assert_eq!(render("[{{region}}]", json!({})), "[]");
        assert_eq!(render("[{{region}}]", json!({ "region": null })), "[]");
        assert_eq!(render("[{{a.b.c}}]", json!({ "a": { "b": 1 } })), "[]");
    }

    #[test]
    fn formats_values() {
        let context = json!({
            "size": 12.5,
            "urgent": false,
            "crops": ["Kale", "Beans"],
            "info": { "spacing": "30cm" }
        });
        assert_eq!(
            render("{{size}} {{urgent}} {{crops}} {{{info}}}", context),
            "12.5 false Kale, Beans {\"spacing\":\"30cm\"}"
        );
    }

    #[test]
    fn dotted_paths_and_indexes() {
        let context = json!({ "crop": { "plantingInfo": { "spacing": "30cm" } }, "list": ["a", "b"] });
        assert_eq!(render("{{crop.plantingInfo.spacing}}", context.clone()), "30cm");
        assert_eq!(render("{{list.1}}", context), "b");
    }

    #[test]
    fn each_resolves_item_then_root() {
        let context = json!({
            "region": "Nakuru",
            "crops": [{ "name": "Kale" }, { "name": "Beans", "region": "Kisumu" }]
        });
        assert_eq!(
            render("{{#each crops}}{{name}}@{{region}} {{/each}}", context),
            "Kale@Nakuru Beans@Kisumu "
        );
    }

    #[test]
    fn each_over_scalars() {
        let context = json!({ "crops": ["Kale", "Beans"] });
        assert_eq!(
            render("{{#each crops}}{{@index}}.{{this}} {{/each}}", context),
            "0.Kale 1.Beans "
        );
        assert_eq!(render("{{#each missing}}x{{/each}}", json!({})), "");
    }

    #[test]
    fn conditionals() {
        let source = "{{#if familySize == 1}}solo{{else}}group{{/if}}";
        assert_eq!(render(source, json!({ "familySize": 1.0 })), "solo");
        assert_eq!(render(source, json!({ "familySize": 4 })), "group");
        assert_eq!(render(source, json!({})), "group");
        assert_eq!(render("{{#if a == 'x'}}yes{{/if}}", json!({ "a": "y" })), "");
    }

    #[test]
    fn conditional_inside_each() {
        let context = json!({ "crops": [{ "name": "Kale", "fav": true }, { "name": "Beans" }] });
        assert_eq!(
            render("{{#each crops}}{{name}}{{#if fav == true}}*{{/if}};{{/each}}", context),
            "Kale*;Beans;"
        );
    }
}

//! Built-in operations.

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use weft_node::{NodeError, NodeInput, NodeOutput};

/// What a built-in node does in its execute step.
///
/// Positional operations (`passthrough`, `uppercase`, `lowercase`, `trim`)
/// map the i-th resolved input to the i-th output field. The others write a
/// single value to every output field they declare (`constant`) or to their
/// only output field (`concat`, `template`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
  Passthrough,
  Uppercase,
  Lowercase,
  Trim,
  /// Join every input, in declaration order, as strings.
  Concat {
    #[serde(default)]
    separator: String,
  },
  /// Render a minijinja template with the resolved input as context.
  Template { template: String },
  Constant { value: Value },
}

impl Operation {
  pub fn name(&self) -> &'static str {
    match self {
      Operation::Passthrough => "passthrough",
      Operation::Uppercase => "uppercase",
      Operation::Lowercase => "lowercase",
      Operation::Trim => "trim",
      Operation::Concat { .. } => "concat",
      Operation::Template { .. } => "template",
      Operation::Constant { .. } => "constant",
    }
  }

  /// Compute the outputs for one invocation.
  pub fn apply(
    &self,
    env: &Environment<'_>,
    input: &NodeInput,
    outputs: &[String],
  ) -> Result<NodeOutput, NodeError> {
    match self {
      Operation::Passthrough => self.positional(input, outputs, |_, value| Ok(value.clone())),
      Operation::Uppercase => self.map_str(input, outputs, str::to_uppercase),
      Operation::Lowercase => self.map_str(input, outputs, str::to_lowercase),
      Operation::Trim => self.map_str(input, outputs, |s| s.trim().to_string()),
      Operation::Concat { separator } => {
        let joined = input
          .values()
          .map(display_string)
          .collect::<Vec<_>>()
          .join(separator.as_str());
        self.single(outputs, Value::String(joined))
      }
      Operation::Template { template } => {
        let value = render(env, template, input)?;
        self.single(outputs, value)
      }
      Operation::Constant { value } => Ok(
        outputs
          .iter()
          .fold(NodeOutput::new(), |out, key| out.with(key.clone(), value.clone())),
      ),
    }
  }

  fn positional<F>(
    &self,
    input: &NodeInput,
    outputs: &[String],
    f: F,
  ) -> Result<NodeOutput, NodeError>
  where
    F: Fn(&str, &Value) -> Result<Value, NodeError>,
  {
    if input.len() != outputs.len() {
      return Err(NodeError::execution(format!(
        "{} maps inputs to outputs by position but got {} inputs for {} outputs",
        self.name(),
        input.len(),
        outputs.len()
      )));
    }

    let mut out = NodeOutput::new();
    for ((key, value), output) in input.iter().zip(outputs) {
      out.insert(output.clone(), f(key, value)?);
    }
    Ok(out)
  }

  fn map_str(
    &self,
    input: &NodeInput,
    outputs: &[String],
    f: impl Fn(&str) -> String,
  ) -> Result<NodeOutput, NodeError> {
    self.positional(input, outputs, |key, value| {
      let s = value.as_str().ok_or_else(|| NodeError::InvalidInput {
        key: key.to_string(),
        message: format!("{} expects a string", self.name()),
      })?;
      Ok(Value::String(f(s)))
    })
  }

  fn single(&self, outputs: &[String], value: Value) -> Result<NodeOutput, NodeError> {
    match outputs {
      [key] => Ok(NodeOutput::new().with(key.clone(), value)),
      _ => Err(NodeError::execution(format!(
        "{} writes exactly one output but {} are declared",
        self.name(),
        outputs.len()
      ))),
    }
  }
}

/// Strings join without their JSON quotes, everything else as JSON.
fn display_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn render(env: &Environment<'_>, template: &str, input: &NodeInput) -> Result<Value, NodeError> {
  let context = minijinja::Value::from_serialize(input.to_map());

  // A template that is a single expression keeps the type of what it yields.
  if let Some(expression) = single_expression(template) {
    let value = env
      .compile_expression(expression)
      .and_then(|compiled| compiled.eval(context))
      .map_err(|e| NodeError::execution(format!("failed to render template: {}", e)))?;
    return serde_json::to_value(&value)
      .map_err(|e| NodeError::execution(format!("template result is not JSON: {}", e)));
  }

  let rendered = env
    .render_str(template, context)
    .map_err(|e| NodeError::execution(format!("failed to render template: {}", e)))?;
  Ok(Value::String(rendered))
}

/// The inner expression of a template that is exactly one `{{ ... }}` block.
fn single_expression(template: &str) -> Option<&str> {
  let inner = template.trim().strip_prefix("{{")?.strip_suffix("}}")?;
  if inner.contains("{{") || inner.contains("}}") || inner.contains("{%") {
    return None;
  }
  let inner = inner.strip_prefix('-').unwrap_or(inner);
  let inner = inner.strip_suffix('-').unwrap_or(inner);
  Some(inner.trim())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn outputs(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
  }

  fn apply(op: Operation, input: NodeInput, keys: &[&str]) -> Result<NodeOutput, NodeError> {
    op.apply(&Environment::new(), &input, &outputs(keys))
  }

  #[test]
  fn test_deserialize_tagged() {
    let op: Operation = serde_json::from_value(json!({"kind": "uppercase"})).unwrap();
    assert_eq!(op, Operation::Uppercase);

    let op: Operation = serde_json::from_value(json!({"kind": "concat"})).unwrap();
    assert_eq!(
      op,
      Operation::Concat {
        separator: String::new()
      }
    );

    assert!(serde_json::from_value::<Operation>(json!({"kind": "shout"})).is_err());
  }

  #[test]
  fn test_positional_mapping() {
    let input = NodeInput::new()
      .with("a", json!(" Left "))
      .with("b", json!("Right"));

    let out = apply(Operation::Uppercase, input.clone(), &["x", "y"]).unwrap();
    assert_eq!(out.get("x"), Some(&json!(" LEFT ")));
    assert_eq!(out.get("y"), Some(&json!("RIGHT")));

    let out = apply(Operation::Trim, input.clone(), &["x", "y"]).unwrap();
    assert_eq!(out.get("x"), Some(&json!("Left")));

    let out = apply(Operation::Lowercase, input, &["x", "y"]).unwrap();
    assert_eq!(out.get("y"), Some(&json!("right")));
  }

  #[test]
  fn test_positional_count_mismatch() {
    let input = NodeInput::new().with("a", json!("x"));
    let err = apply(Operation::Passthrough, input, &["x", "y"]).unwrap_err();
    assert_eq!(
      err.to_string(),
      "passthrough maps inputs to outputs by position but got 1 inputs for 2 outputs"
    );
  }

  #[test]
  fn test_string_operation_rejects_non_string() {
    let input = NodeInput::new().with("n", json!(3));
    let err = apply(Operation::Uppercase, input, &["out"]).unwrap_err();
    assert!(matches!(err, NodeError::InvalidInput { ref key, .. } if key == "n"));
  }

  #[test]
  fn test_passthrough_keeps_types() {
    let input = NodeInput::new().with("n", json!({"deep": [1, 2]}));
    let out = apply(Operation::Passthrough, input, &["copy"]).unwrap();
    assert_eq!(out.get("copy"), Some(&json!({"deep": [1, 2]})));
  }

  #[test]
  fn test_concat() {
    let input = NodeInput::new()
      .with("greeting", json!("hello"))
      .with("count", json!(3));
    let op = Operation::Concat {
      separator: " ".to_string(),
    };

    let out = apply(op.clone(), input.clone(), &["line"]).unwrap();
    assert_eq!(out.get("line"), Some(&json!("hello 3")));

    assert!(apply(op, input, &["a", "b"]).is_err());
  }

  #[test]
  fn test_template() {
    let input = NodeInput::new()
      .with("name", json!("ada"))
      .with("count", json!(2));

    let op = Operation::Template {
      template: "Hello {{ name | title }} x{{ count }}".to_string(),
    };
    let out = apply(op, input.clone(), &["line"]).unwrap();
    assert_eq!(out.get("line"), Some(&json!("Hello Ada x2")));

    let op = Operation::Template {
      template: "{{ count + 1 }}".to_string(),
    };
    let out = apply(op, input, &["next"]).unwrap();
    assert_eq!(out.get("next"), Some(&json!(3)));
  }

  #[test]
  fn test_single_expression_keeps_input_types() {
    let input = NodeInput::new()
      .with("flag", json!("true"))
      .with("digits", json!("123"))
      .with("nothing", json!("null"))
      .with("items", json!([1, "two"]));

    for (key, expected) in [
      ("flag", json!("true")),
      ("digits", json!("123")),
      ("nothing", json!("null")),
      ("items", json!([1, "two"])),
    ] {
      let op = Operation::Template {
        template: format!("{{{{ {} }}}}", key),
      };
      let out = apply(op, input.clone(), &["out"]).unwrap();
      assert_eq!(out.get("out"), Some(&expected), "template over '{}'", key);
    }
  }

  #[test]
  fn test_single_expression_with_whitespace_control() {
    let input = NodeInput::new().with("name", json!("ada"));
    let op = Operation::Template {
      template: "{{- name | upper -}}".to_string(),
    };
    let out = apply(op, input, &["out"]).unwrap();
    assert_eq!(out.get("out"), Some(&json!("ADA")));
  }

  #[test]
  fn test_template_syntax_error() {
    let op = Operation::Template {
      template: "{{ unclosed".to_string(),
    };
    let err = apply(op, NodeInput::new(), &["out"]).unwrap_err();
    assert!(err.to_string().starts_with("failed to render template"));
  }

  #[test]
  fn test_constant_fills_every_output() {
    let op = Operation::Constant { value: json!(true) };
    let out = apply(op, NodeInput::new(), &["a", "b"]).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out.get("b"), Some(&json!(true)));
  }
}

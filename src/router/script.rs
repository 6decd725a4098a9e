//! `evaluate`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::browser::EvalArg;
use crate::error::{Error, Result};
use crate::identifiers::ObjectId;
use crate::protocol::params::{self, EvaluateParams, require, require_non_empty};
use crate::session::Session;

// ============================================================================
// Method Names
// ============================================================================

pub(super) const EVALUATE: &str = "evaluate";

// ============================================================================
// Handlers
// ============================================================================

/// Calls a function in the page and serializes its result.
///
/// The result handle is registered so later commands can refer to it by
/// object id. Nested values are not registered.
pub(super) async fn evaluate(session: &Session, params: &Map<String, Value>) -> Result<Value> {
    let p: EvaluateParams = params::parse(EVALUATE, params)?;
    let context = require(EVALUATE, "context", p.context)?;
    let page = session.registry().page(&context)?;
    let function = require_non_empty(EVALUATE, "function", p.function)?;

    let args = p
        .args
        .into_iter()
        .map(|arg| eval_arg(session, arg))
        .collect::<Result<Vec<_>>>()?;

    let handle = page.evaluate(&function, args).await?;
    session.registry().register_object(Arc::clone(&handle))?;

    let value = session.serializer().serialize(handle.as_ref()).await?;
    Ok(serde_json::to_value(value)?)
}

/// Resolves one argument.
///
/// | Shape | Passed as |
/// |-------|-----------|
/// | `{"objectId": id, ...}` | registered handle |
/// | `{"value": v}` or `{"type": t, "value": v}` | `v` |
/// | anything else | itself |
fn eval_arg(session: &Session, arg: Value) -> Result<EvalArg> {
    let mut map = match arg {
        Value::Object(map) => map,
        other => return Ok(EvalArg::Value(other)),
    };

    match map.get("objectId") {
        Some(Value::String(id)) => {
            let handle = session.registry().object(&ObjectId::new(id.as_str()))?;
            return Ok(EvalArg::Handle(handle));
        }
        Some(_) => {
            return Err(Error::invalid_param(
                EVALUATE,
                "argument objectId must be a string",
            ));
        }
        None => {}
    }

    let is_local_value =
        map.contains_key("value") && map.keys().all(|k| k == "value" || k == "type");
    if is_local_value {
        return Ok(EvalArg::Value(map.remove("value").unwrap_or(Value::Null)));
    }

    Ok(EvalArg::Value(Value::Object(map)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::browser::EvalArg;
    use crate::browser::memory::MemoryHandle;
    use crate::router::tests::Fixture;

    #[tokio::test]
    async fn test_evaluate_number() {
        let fx = Fixture::new();
        fx.page.script("() => 1+1", MemoryHandle::number(2));
        assert_eq!(
            fx.call(7, "evaluate", json!({"context": fx.context(), "function": "() => 1+1"}))
                .await,
            json!({"id": 7, "result": {"type": "number", "value": 2}})
        );
        assert_eq!(fx.session.registry().object_count(), 0);
    }

    #[tokio::test]
    async fn test_evaluate_registers_top_level_only() {
        let fx = Fixture::new();
        fx.page.script(
            "() => [window]",
            MemoryHandle::array(vec![MemoryHandle::window()]),
        );
        let v = fx
            .call(1, "evaluate", json!({"context": fx.context(), "function": "() => [window]"}))
            .await;
        assert_eq!(v["result"]["type"], "array");
        assert_eq!(v["result"]["value"][0]["type"], "window");
        assert_eq!(fx.session.registry().object_count(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_resolves_object_args() {
        let fx = Fixture::new();
        fx.page.script("() => document.body", MemoryHandle::element("body", &[], vec![]));
        fx.page.script("(el, n) => el.tagName", MemoryHandle::string("BODY"));

        let v = fx
            .call(1, "evaluate", json!({"context": fx.context(), "function": "() => document.body"}))
            .await;
        let object_id = v["result"]["objectId"].as_str().expect("objectId").to_string();

        let v = fx
            .call(
                2,
                "evaluate",
                json!({
                    "context": fx.context(),
                    "function": "(el, n) => el.tagName",
                    "args": [{"type": "node", "objectId": object_id}, {"type": "number", "value": 3}, "x"]
                }),
            )
            .await;
        assert_eq!(v["result"], json!({"type": "string", "value": "BODY"}));

        let args = fx.page.last_args();
        assert_eq!(args.len(), 3);
        match &args[0] {
            EvalArg::Handle(h) => assert_eq!(h.object_id().map(|id| id.as_str()), Some(object_id.as_str())),
            other => panic!("expected handle, got {other:?}"),
        }
        assert!(matches!(&args[1], EvalArg::Value(v) if *v == json!(3)));
        assert!(matches!(&args[2], EvalArg::Value(v) if *v == json!("x")));
    }

    #[tokio::test]
    async fn test_evaluate_unknown_object_arg() {
        let fx = Fixture::new();
        fx.page.script("(x) => x", MemoryHandle::undefined());
        let v = fx
            .call(
                1,
                "evaluate",
                json!({"context": fx.context(), "function": "(x) => x", "args": [{"objectId": "gone"}]}),
            )
            .await;
        assert_eq!(v["message"], "element not found: gone");
    }

    #[tokio::test]
    async fn test_evaluate_library_error_is_verbatim() {
        let fx = Fixture::new();
        let v = fx
            .call(1, "evaluate", json!({"context": fx.context(), "function": "() => boom()"}))
            .await;
        assert_eq!(v["error"], "unknown error");
        assert_eq!(
            v["message"],
            "Evaluation failed: SyntaxError: no scripted result for () => boom()"
        );
    }

    #[tokio::test]
    async fn test_evaluate_args_must_be_array() {
        let fx = Fixture::new();
        let v = fx
            .call(
                1,
                "evaluate",
                json!({"context": fx.context(), "function": "() => 1", "args": "nope"}),
            )
            .await;
        assert_eq!(v["error"], "unknown error");
        assert!(
            v["message"]
                .as_str()
                .expect("message")
                .starts_with("invalid parameter for evaluate")
        );
    }
}

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::evaluator::EvalError;
use crate::functions::{Form, Function, Param};
use crate::output::to_json;
use crate::value::Value;

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("to-base64", "Encodes a string as standard base64")
            .form(Form::new(&[Param::String], |args| {
                Ok(Value::String(STANDARD.encode(args.str(0)?)))
            })),
        Function::new("from-base64", "Decodes standard base64 into a UTF-8 string")
            .form(Form::new(&[Param::String], |args| {
                let bytes = STANDARD
                    .decode(args.str(0)?)
                    .map_err(|e| EvalError::Argument(format!("invalid base64: {e}")))?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|_| EvalError::Argument("decoded base64 is not valid UTF-8".to_string()))
            })),
        Function::new("to-json", "Renders a value as compact JSON")
            .form(Form::new(&[Param::Any], |args| Ok(Value::String(to_json(args.value(0)?))))),
        Function::new("from-json", "Parses a JSON string")
            .form(Form::new(&[Param::String], |args| {
                serde_json::from_str::<serde_json::Value>(args.str(0)?)
                    .map(Value::from)
                    .map_err(|e| EvalError::Argument(format!("invalid JSON: {e}")))
            })),
        digest_function::<Sha1>("sha1", "Hex SHA-1 digest of a string"),
        digest_function::<Sha256>("sha256", "Hex SHA-256 digest of a string"),
        digest_function::<Sha512>("sha512", "Hex SHA-512 digest of a string"),
    ]
}

fn digest_function<D: Digest + 'static>(name: &str, description: &str) -> Function {
    Function::new(name, description).form(Form::new(&[Param::String], |args| {
        Ok(Value::String(hex_digest::<D>(args.str(0)?.as_bytes())))
    }))
}

fn hex_digest<D: Digest>(bytes: &[u8]) -> String {
    D::digest(bytes).iter().map(|byte| format!("{byte:02x}")).collect()
}

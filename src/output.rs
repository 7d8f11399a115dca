use crate::error::FatimaError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct JsonResult<T: Serialize> {
    pub ok: bool,
    pub result: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

pub fn print_json<T: Serialize>(payload: &T) -> Result<(), FatimaError> {
    let text = serde_json::to_string_pretty(payload)?;
    println!("{}", text);
    Ok(())
}

/// Prints `payload` as a JSON envelope, or runs `text` for humans.
pub fn emit<T: Serialize>(
    json: bool,
    payload: &T,
    text: impl FnOnce(),
) -> Result<(), FatimaError> {
    if json {
        let wrapper = JsonResult {
            ok: true,
            result: Some(payload),
            error: None,
            error_code: None,
        };
        print_json(&wrapper)
    } else {
        text();
        Ok(())
    }
}

/// Reports a failed command and exits with status 1.
pub fn exit_with_error(json: bool, err: &FatimaError) -> ! {
    tracing::debug!(code = err.code(), "command failed");
    if json {
        let payload = JsonResult::<serde_json::Value> {
            ok: false,
            result: None,
            error: Some(err.to_string()),
            error_code: Some(err.code()),
        };
        if print_json(&payload).is_err() {
            eprintln!("{err}");
        }
    } else {
        eprintln!("{err}");
    }
    std::process::exit(1);
}

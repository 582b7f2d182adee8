use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use super::bootstrap::Server;
use super::protocol::{encode_response, parse_wire_line, ToolResponse, WireLine};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LoopSummary {
    pub(crate) handled: u64,
    pub(crate) failed: u64,
}

/// Serves requests one line at a time until the reader hits EOF.
///
/// Tool failures become `ok: false` responses; only I/O on the transport
/// itself ends the loop with an error.
pub(crate) fn run_request_loop<R, W>(
    server: &Server,
    reader: R,
    mut writer: W,
) -> io::Result<LoopSummary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = LoopSummary::default();
    for line in reader.lines() {
        let line = line?;
        let Some(response) = handle_line(server, &line) else {
            continue;
        };
        summary.handled += 1;
        if !response.ok {
            summary.failed += 1;
        }
        writeln!(writer, "{}", encode_response(&response))?;
        writer.flush()?;
    }
    Ok(summary)
}

fn handle_line(server: &Server, line: &str) -> Option<ToolResponse> {
    let request = match parse_wire_line(line) {
        WireLine::Blank => return None,
        WireLine::Malformed { id, reason } => {
            warn!(reason = %reason, "tool_request_malformed");
            return Some(ToolResponse::failure(id, reason));
        }
        WireLine::Request(request) => request,
    };

    debug!(tool = %request.tool, id = %request.id, "tool_request_received");
    match server
        .registry
        .dispatch(&server.database, &request.tool, &request.args)
    {
        Ok(output) => {
            debug!(tool = %request.tool, message = %output.message, "tool_request_succeeded");
            Some(ToolResponse::success(request.id, output.message, output.data))
        }
        Err(error) => {
            warn!(
                tool = %request.tool,
                category = error.category(),
                error = %error,
                "tool_request_failed"
            );
            Some(ToolResponse::failure(request.id, error.to_string()))
        }
    }
}

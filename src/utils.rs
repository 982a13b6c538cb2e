use tokio::io::{self, AsyncBufReadExt, AsyncRead};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::runner::{CommandRunner, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Forwards every non-blank line of `reader` to `sender`, tagged with its stream.
///
/// Lines are decoded lossily, so stray non-UTF-8 bytes never end the stream early.
pub async fn handle_stream<R: AsyncRead + Unpin>(
    reader: R,
    kind: StreamKind,
    sender: UnboundedSender<(StreamKind, String)>,
) {
    let mut reader = io::BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let text = String::from_utf8_lossy(&buf);
        // ssh ends its messages with "\r\n"; progress bars redraw with a bare '\r'.
        let text = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
        let Some(frame) = text.split('\r').filter(|f| !f.trim().is_empty()).last() else {
            continue;
        };
        if sender.send((kind, format!("{}\n", frame))).is_err() {
            break;
        }
    }
}

/// Strips escape sequences and line endings before a line is echoed to the terminal.
pub fn clean_line(line: &str) -> String {
    line.trim_end()
        .replace('\x1B', "")
        .replace('\r', "")
        .replace('\n', "")
}

/// Resolves `tool` on the PATH with `which`.
pub async fn which<R: CommandRunner>(runner: &R, tool: &str) -> Result<Option<String>> {
    let output = runner.run(&Invocation::new("which").arg(tool)).await?;
    let path = output.stdout.trim().to_string();

    if !output.success || path.is_empty() {
        Ok(None)
    } else {
        Ok(Some(path))
    }
}

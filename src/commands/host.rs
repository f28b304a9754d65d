use std::io::Write;

/// The process environment a command runs against.
///
/// Commands print through the host and ask it to exit, never touching stdout, stderr or
/// `std::process` themselves, so a test can run them in-process and inspect what they printed.
pub trait Host: Send + Sync {
    /// Stream for command results.
    fn output(&mut self) -> impl Write;

    /// Stream for diagnostics shown to the user.
    fn error(&mut self) -> impl Write;

    /// Ends the run with `code`. Test hosts record the code and return.
    fn exit(&mut self, code: i32);
}

/// Records everything a command prints and the exit code it asks for.
#[cfg(test)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
            exit_code: None,
        }
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

/// Host whose output stream is closed, like stdout piped into a process that already quit.
#[cfg(test)]
pub struct ClosedHost;

#[cfg(test)]
struct ClosedStream;

#[cfg(test)]
impl Write for ClosedStream {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl Host for ClosedHost {
    fn output(&mut self) -> impl Write {
        ClosedStream
    }

    fn error(&mut self) -> impl Write {
        ClosedStream
    }

    fn exit(&mut self, _code: i32) {}
}

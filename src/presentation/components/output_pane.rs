use crate::domain::services::OutputStream;

const MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Text shown in the command output pane. Lives on the UI thread only.
#[derive(Debug, Default)]
pub struct OutputPane {
    text: String,
    stderr_chunks: usize,
    printed: usize,
    follow: bool,
}

impl OutputPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, stream: OutputStream, chunk: &str) {
        if stream == OutputStream::Stderr {
            self.stderr_chunks += 1;
        }
        self.text.push_str(chunk);

        if self.text.len() > MAX_OUTPUT_BYTES {
            let mut cut = self.text.len() - MAX_OUTPUT_BYTES;
            while !self.text.is_char_boundary(cut) {
                cut += 1;
            }
            self.text.drain(..cut);
            self.printed = self.printed.saturating_sub(cut);
        }
    }

    pub fn scroll_to_end(&mut self) {
        self.follow = true;
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn stderr_chunks(&self) -> usize {
        self.stderr_chunks
    }

    /// Text appended since the previous call.
    pub fn take_unprinted(&mut self) -> &str {
        let start = self.printed.min(self.text.len());
        self.printed = self.text.len();
        &self.text[start..]
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.printed = 0;
        self.follow = false;
    }
}

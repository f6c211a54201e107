//! Incremental decoder for `text/event-stream` bodies.
//!
//! Horizon streams resources as server-sent events. Chunks from the HTTP body
//! arrive at arbitrary boundaries, so the decoder buffers partial lines and
//! only emits an event once its terminating blank line has been seen.

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
	pub id: Option<String>,
	pub event: Option<String>,
	pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
	buffer: Vec<u8>,
	pending: SseEvent,
	has_data: bool,
}

impl SseDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feed a chunk of the body, returning every event completed by it.
	pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
		self.buffer.extend_from_slice(chunk);

		let mut events = Vec::new();
		while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
			let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
			let line = String::from_utf8_lossy(&raw);
			let line = line.trim_end_matches(['\n', '\r']);
			if let Some(event) = self.process_line(line) {
				events.push(event);
			}
		}
		events
	}

	fn process_line(&mut self, line: &str) -> Option<SseEvent> {
		if line.is_empty() {
			let event = std::mem::take(&mut self.pending);
			let dispatch = std::mem::replace(&mut self.has_data, false);
			return dispatch.then_some(event);
		}
		// Comment line
		if line.starts_with(':') {
			return None;
		}

		let (field, value) = match line.split_once(':') {
			Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
			None => (line, ""),
		};

		match field {
			"data" => {
				if self.has_data {
					self.pending.data.push('\n');
				}
				self.pending.data.push_str(value);
				self.has_data = true;
			}
			"id" => self.pending.id = Some(value.to_string()),
			"event" => self.pending.event = Some(value.to_string()),
			_ => {}
		}
		None
	}
}

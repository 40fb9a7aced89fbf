/// One generated line: the characters drawn for a single chunk of payload.
pub type Message = Vec<char>;

/// Joins messages into a document, one message per line.
pub fn serialize(messages: &[Message]) -> String {
	messages
		.iter()
		.map(|message| message.iter().collect::<String>())
		.collect::<Vec<_>>()
		.join("\n")
}

/// Splits a document into messages, one per line, one token per character.
pub fn tokenize(document: &str) -> Vec<Message> {
	document.split('\n').map(|line| line.chars().collect()).collect()
}

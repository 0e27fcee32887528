//! Builders turning each request shape into backend `Contents`.

use crate::dtos::UploadedFile;
use crate::services::providers::{Contents, Message, Part};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const SUMMARIZE_DOCUMENT_PREFIX: &str = "Summarize the following document: ";

pub const TRANSCRIBE_AUDIO_INSTRUCTION: &str = "Transcribe the following audio:";

/// The prompt is the whole payload.
pub fn text_contents(prompt: String) -> Contents {
    Contents::Prompt(prompt)
}

/// Prompt first, then the image inline.
pub fn image_contents(prompt: String, image: &UploadedFile) -> Contents {
    Contents::Messages(vec![Message::user(vec![
        Part::text(prompt),
        inline_part(image),
    ])])
}

/// Document bytes are read as UTF-8, replacing invalid sequences with U+FFFD.
pub fn document_contents(document: &UploadedFile) -> Contents {
    let text = String::from_utf8_lossy(&document.bytes);
    Contents::Messages(vec![Message::user(vec![Part::text(format!(
        "{}{}",
        SUMMARIZE_DOCUMENT_PREFIX, text
    ))])])
}

pub fn audio_contents(audio: &UploadedFile) -> Contents {
    Contents::Messages(vec![Message::user(vec![
        Part::text(TRANSCRIBE_AUDIO_INSTRUCTION),
        inline_part(audio),
    ])])
}

/// Standard (padded) base64 of the upload, tagged with its MIME type.
pub fn inline_part(file: &UploadedFile) -> Part {
    Part::inline_data(file.mime_type.clone(), STANDARD.encode(&file.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{Blob, Role};

    fn single_message(contents: Contents) -> Message {
        match contents {
            Contents::Messages(mut messages) => {
                assert_eq!(messages.len(), 1);
                messages.remove(0)
            }
            Contents::Prompt(_) => panic!("expected role-tagged messages"),
        }
    }

    #[test]
    fn text_prompt_is_passed_through() {
        assert_eq!(
            text_contents("Write a haiku".to_string()),
            Contents::Prompt("Write a haiku".to_string())
        );
    }

    #[test]
    fn image_has_prompt_then_inline_data() {
        let image = UploadedFile::new("image/png", vec![0x89, b'P', b'N', b'G']);
        let message = single_message(image_contents("What is this?".to_string(), &image));

        assert_eq!(message.role, Role::User);
        assert_eq!(
            message.parts,
            vec![
                Part::Text {
                    text: "What is this?".to_string()
                },
                Part::InlineData {
                    inline_data: Blob {
                        mime_type: "image/png".to_string(),
                        data: "iVBORw==".to_string(),
                    }
                },
            ]
        );
    }

    #[test]
    fn document_is_prefixed_with_summarize_instruction() {
        let doc = UploadedFile::new("text/plain", "Quarterly results were strong.");
        let message = single_message(document_contents(&doc));

        assert_eq!(
            message.parts,
            vec![Part::text(
                "Summarize the following document: Quarterly results were strong."
            )]
        );
    }

    #[test]
    fn invalid_utf8_document_is_decoded_lossily() {
        let doc = UploadedFile::new("application/pdf", vec![b'o', b'k', 0xff, 0xfe]);
        let message = single_message(document_contents(&doc));

        assert_eq!(
            message.parts,
            vec![Part::text(
                "Summarize the following document: ok\u{FFFD}\u{FFFD}"
            )]
        );
    }

    #[test]
    fn empty_document_still_produces_prefix() {
        let doc = UploadedFile::new("text/plain", Vec::new());
        let message = single_message(document_contents(&doc));
        assert_eq!(message.parts, vec![Part::text(SUMMARIZE_DOCUMENT_PREFIX)]);
    }

    #[test]
    fn audio_has_fixed_instruction_then_inline_data() {
        let audio = UploadedFile::new("audio/wav", b"RIFF".to_vec());
        let message = single_message(audio_contents(&audio));

        assert_eq!(
            message.parts,
            vec![
                Part::text("Transcribe the following audio:"),
                Part::inline_data("audio/wav", "UklGRg=="),
            ]
        );
    }
}

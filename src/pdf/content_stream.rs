use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

use crate::error::MarkupError;

/// Builds a page content stream from drawing commands (PDF user space, y-up).
#[derive(Debug, Default)]
pub struct ContentBuilder {
    operations: Vec<Operation>,
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paints image XObject `name` into the rectangle with lower-left corner
    /// `(x, y)`: `q w 0 0 h x y cm /name Do Q`.
    pub fn draw_image(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
        ));
        self.operations
            .push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.operations.push(Operation::new("Q", vec![]));
        self
    }

    /// One line of text at baseline `(x, y)` in font resource `font`.
    pub fn text(&mut self, font: &str, size: f64, x: f64, y: f64, text: &str) -> &mut Self {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), real(size)],
        ));
        self.operations
            .push(Operation::new("Td", vec![real(x), real(y)]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        self.operations.push(Operation::new("ET", vec![]));
        self
    }

    pub fn encode(self) -> crate::error::Result<Vec<u8>> {
        Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|e| MarkupError::pdf_write(format!("content stream: {e}")))
    }
}

/// 標準14フォント(WinAnsiEncoding)で表示できるバイト列に変換する。
///
/// Latin-1 maps directly; the handful of WinAnsi extras in 0x80..0x9F are
/// translated; anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

//! Input sources for the deserializer

use crate::error::{Code, Error, Result};

/// Bytes that terminate a bare token: the grammar's reserved characters,
/// the reserved-for-extension set `*@$`, and insignificant whitespace.
/// Every other byte, non-ASCII UTF-8 included, may appear unquoted.
const NOT_ID_CHARS: &[u8] = b" \t\r\n'!:(),*@$";

pub(crate) fn is_id_char(b: u8) -> bool {
    !NOT_ID_CHARS.contains(&b)
}

/// Whether a bare token may *begin* with this byte. A leading digit or `-`
/// commits the token to the number grammar instead.
pub(crate) fn is_id_start(b: u8) -> bool {
    is_id_char(b) && !b.is_ascii_digit() && b != b'-'
}

/// A string parsed out of the input, either borrowed directly from the
/// original data or copied into the scratch buffer to undo escapes.
pub enum Reference<'b, 'c, T: ?Sized> {
    Borrowed(&'b T),
    Copied(&'c T),
}

impl<'b, 'c, T: ?Sized> Reference<'b, 'c, T> {
    fn map<O: ?Sized>(self, f: impl for<'r> FnOnce(&'r T) -> &'r O) -> Reference<'b, 'c, O> {
        match self {
            Reference::Borrowed(b) => Reference::Borrowed(f(b)),
            Reference::Copied(c) => Reference::Copied(f(c)),
        }
    }

    fn try_map<O: ?Sized, E>(
        self,
        f: impl for<'r> FnOnce(&'r T) -> std::result::Result<&'r O, E>,
    ) -> std::result::Result<Reference<'b, 'c, O>, E> {
        Ok(match self {
            Reference::Borrowed(b) => Reference::Borrowed(f(b)?),
            Reference::Copied(c) => Reference::Copied(f(c)?),
        })
    }
}

/// A source of Rison input.
pub trait Read<'de> {
    /// Consume and return the next byte.
    fn next(&mut self) -> Result<Option<u8>> {
        let next = self.peek()?;
        if next.is_some() {
            self.discard();
        }
        Ok(next)
    }

    /// Return the next byte without consuming it.
    fn peek(&mut self) -> Result<Option<u8>>;

    /// Return the byte after the next one without consuming either.
    fn peek2(&mut self) -> Result<Option<u8>>;

    /// Consume the byte previously returned by `peek`.
    fn discard(&mut self);

    /// Offset of the next unconsumed byte.
    fn position(&self) -> usize;

    /// Parse the body of a quoted string, undoing `!` escapes, up to and
    /// including the closing `'`.
    fn parse_str<'s>(&'s mut self, scratch: &'s mut Vec<u8>) -> Result<Reference<'de, 's, str>>;

    /// Parse a maximal run of bare (identifier) bytes.
    fn parse_ident<'s>(&'s mut self, scratch: &'s mut Vec<u8>) -> Result<Reference<'de, 's, str>>;
}

pub struct SliceRead<'a> {
    slice: &'a [u8],
    /// Index of the *next* byte that will be returned by next() or peek().
    index: usize,
}

impl<'a> SliceRead<'a> {
    /// Create a Rison input source reading from a slice of bytes.
    pub fn new(slice: &'a [u8]) -> Self {
        SliceRead { slice, index: 0 }
    }

    /// Parse a quoted-string body until the closing delimiter.
    /// # Safety
    /// Although this method is safe, and thus has no safety preconditions,
    /// safety elsewhere relies on the guarantee provided by this method that
    /// it will not transform the input stream such that valid utf-8 in the
    /// input becomes invalid in the output.
    fn parse_str_bytes<'s>(
        &'s mut self,
        scratch: &'s mut Vec<u8>,
    ) -> Result<Reference<'a, 's, [u8]>> {
        let mut start = self.index;
        loop {
            if self.index == self.slice.len() {
                return Err(Error::new(Code::EofString, self.position()));
            }
            match self.slice[self.index] {
                b'\'' => {
                    if scratch.is_empty() {
                        let borrowed = &self.slice[start..self.index];
                        self.index += 1;
                        return Ok(Reference::Borrowed(borrowed));
                    } else {
                        scratch.extend_from_slice(&self.slice[start..self.index]);
                        self.index += 1;
                        return Ok(Reference::Copied(scratch));
                    }
                }
                b'!' => {
                    scratch.extend_from_slice(&self.slice[start..self.index]);
                    self.index += 1;
                    let escape_position = self.index;
                    scratch.push(
                        match self
                            .next()?
                            .ok_or_else(|| Error::new(Code::EofString, escape_position))?
                        {
                            c @ (b'!' | b'\'') => c,
                            _ => return Err(Error::new(Code::InvalidEscape, escape_position)),
                        },
                    );
                    start = self.index;
                }
                _ => {
                    self.index += 1;
                }
            }
        }
    }

    /// Parse a bare token until the first delimiter byte.
    /// # Safety
    /// Although this method is safe, and thus has no safety preconditions,
    /// safety elsewhere relies on the guarantee provided by this method that
    /// it will not transform the input stream such that valid utf-8 in the
    /// input becomes invalid in the output.
    fn parse_ident_bytes(&mut self) -> &'a [u8] {
        let start = self.index;
        while self.index < self.slice.len() && is_id_char(self.slice[self.index]) {
            self.index += 1;
        }

        &self.slice[start..self.index]
    }
}

impl<'a> Read<'a> for SliceRead<'a> {
    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.slice.get(self.index).copied())
    }

    fn peek2(&mut self) -> Result<Option<u8>> {
        Ok(self.slice.get(self.index + 1).copied())
    }

    fn discard(&mut self) {
        self.index += 1;
    }

    fn position(&self) -> usize {
        self.index
    }

    fn parse_str<'s>(&'s mut self, scratch: &'s mut Vec<u8>) -> Result<Reference<'a, 's, str>> {
        let start_position = self.position();
        let bytes = self.parse_str_bytes(scratch)?;
        bytes
            .try_map(std::str::from_utf8)
            .map_err(|e| Error::new(Code::InvalidUnicode, start_position + e.valid_up_to()))
    }

    fn parse_ident<'s>(&'s mut self, _scratch: &'s mut Vec<u8>) -> Result<Reference<'a, 's, str>> {
        let start_position = self.position();
        let bytes = self.parse_ident_bytes();

        std::str::from_utf8(bytes)
            .map_err(|e| Error::new(Code::InvalidUnicode, start_position + e.valid_up_to()))
            .map(Reference::Borrowed)
    }
}

pub struct StrRead<'a> {
    delegate: SliceRead<'a>,
}

impl<'a> StrRead<'a> {
    /// Create a Rison input source reading from a string.
    pub fn new(s: &'a str) -> Self {
        StrRead {
            delegate: SliceRead::new(s.as_bytes()),
        }
    }
}

impl<'a> Read<'a> for StrRead<'a> {
    fn peek(&mut self) -> Result<Option<u8>> {
        self.delegate.peek()
    }

    fn peek2(&mut self) -> Result<Option<u8>> {
        self.delegate.peek2()
    }

    fn discard(&mut self) {
        self.delegate.discard()
    }

    fn position(&self) -> usize {
        self.delegate.position()
    }

    fn parse_str<'s>(&'s mut self, scratch: &'s mut Vec<u8>) -> Result<Reference<'a, 's, str>> {
        let bytes = self.delegate.parse_str_bytes(scratch)?;

        // # Safety
        // `parse_str_bytes` guarantees it will not transform input such that
        // valid utf-8 becomes invalid. StrRead's buffer is guaranteed to be
        // valid utf-8 by construction. The resulting buffer is therefore
        // valid utf-8, satisfying the safety preconditions of
        // `str::from_utf8_unchecked`.
        Ok(bytes.map(|b| unsafe { std::str::from_utf8_unchecked(b) }))
    }

    fn parse_ident<'s>(&'s mut self, _scratch: &'s mut Vec<u8>) -> Result<Reference<'a, 's, str>> {
        let bytes = self.delegate.parse_ident_bytes();

        // # Safety
        // `parse_ident_bytes` guarantees it will not transform input such
        // that valid utf-8 becomes invalid. StrRead's buffer is guaranteed
        // to be valid utf-8 by construction. The resulting buffer is
        // therefore valid utf-8, satisfying the safety preconditions of
        // `str::from_utf8_unchecked`.
        Ok(Reference::Borrowed(unsafe {
            std::str::from_utf8_unchecked(bytes)
        }))
    }
}

pub struct IoRead<I> {
    io: std::io::Bytes<I>,
    /// Lookahead buffer; slot 0 is the next byte, slot 1 the one after.
    peeked: [Option<u8>; 2],
    position: usize,
}

impl<I: std::io::Read> IoRead<I> {
    pub fn new(reader: I) -> Self {
        IoRead {
            io: reader.bytes(),
            peeked: [None, None],
            position: 0,
        }
    }

    fn fill(&mut self, slot: usize) -> Result<Option<u8>> {
        if self.peeked[slot].is_none() {
            self.peeked[slot] = self
                .io
                .next()
                .transpose()
                .map_err(|e| Error::new(Code::Io(e), self.position + slot))?;
        }
        Ok(self.peeked[slot])
    }
}

impl<'de, I> Read<'de> for IoRead<I>
where
    I: std::io::Read,
{
    fn peek(&mut self) -> Result<Option<u8>> {
        self.fill(0)
    }

    fn peek2(&mut self) -> Result<Option<u8>> {
        if self.fill(0)?.is_none() {
            return Ok(None);
        }
        self.fill(1)
    }

    fn discard(&mut self) {
        self.peeked[0] = self.peeked[1].take();
        self.position += 1;
    }

    fn position(&self) -> usize {
        self.position
    }

    fn parse_str<'s>(&'s mut self, scratch: &'s mut Vec<u8>) -> Result<Reference<'de, 's, str>> {
        let start_position = self.position();
        loop {
            let Some(ch) = self.peek()? else {
                return Err(Error::new(Code::EofString, self.position()));
            };

            match ch {
                b'\'' => {
                    self.discard();
                    return std::str::from_utf8(scratch)
                        .map_err(|e| {
                            Error::new(Code::InvalidUnicode, start_position + e.valid_up_to())
                        })
                        .map(Reference::Copied);
                }
                b'!' => {
                    self.discard();
                    let escape_position = self.position();
                    scratch.push(
                        match self
                            .next()?
                            .ok_or_else(|| Error::new(Code::EofString, escape_position))?
                        {
                            c @ (b'!' | b'\'') => c,
                            _ => return Err(Error::new(Code::InvalidEscape, escape_position)),
                        },
                    );
                }
                _ => {
                    scratch.push(ch);
                    self.discard();
                }
            }
        }
    }

    fn parse_ident<'s>(&'s mut self, scratch: &'s mut Vec<u8>) -> Result<Reference<'de, 's, str>> {
        let start_position = self.position();
        while let Some(ch) = self.peek()? {
            if !is_id_char(ch) {
                break;
            }
            scratch.push(ch);
            self.discard();
        }

        std::str::from_utf8(scratch)
            .map_err(|e| Error::new(Code::InvalidUnicode, start_position + e.valid_up_to()))
            .map(Reference::Copied)
    }
}

//! The per pixel evaluation context a shader program runs against, and the color value it
//! produces.

use std::fmt::{Display, Formatter};

/// The four read only inputs a shader program can sample. Each is conceptually six bits
/// wide; wider values are masked on read rather than rejected, exactly as the hardware
/// ignores the unwired upper lines.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ShaderContext {
  pub x    : u8, // Horizontal tile coordinate
  pub y    : u8, // Vertical tile coordinate
  pub time : u8, // Frame counter
  pub user : u8, // Externally supplied value
}

impl ShaderContext {
  pub fn new(x: u8, y: u8, time: u8, user: u8) -> ShaderContext {
    ShaderContext { x, y, time, user }
  }
}

/// The output color latch. Each channel holds two bits, for 64 representable colors.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Color {
  /// The channels as a tuple, in RGB order.
  pub fn channels(&self) -> (u8, u8, u8) {
    (self.r, self.g, self.b)
  }

  /// Expands one two bit channel to eight bits: the channel occupies the top two bits,
  /// and the low channel bit fills the remaining six.
  pub fn expand_channel(channel: u8) -> u8 {
    let mut expanded = (channel & 0b11) << 6;
    if channel & 0b01 != 0 {
      expanded |= 0b0011_1111;
    }
    expanded
  }

  /// The color as conventional eight bit RGB, for writing preview images.
  pub fn to_rgb8(&self) -> [u8; 3] {
    [
      Color::expand_channel(self.r),
      Color::expand_channel(self.g),
      Color::expand_channel(self.b),
    ]
  }
}

impl Display for Color {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "({}, {}, {})", self.r, self.g, self.b)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_expansion_covers_full_range() {
    assert_eq!(Color::expand_channel(0), 0x00);
    assert_eq!(Color::expand_channel(1), 0x7F);
    assert_eq!(Color::expand_channel(2), 0x80);
    assert_eq!(Color::expand_channel(3), 0xFF);
  }

  #[test]
  fn expansion_ignores_bits_above_the_channel() {
    assert_eq!(Color::expand_channel(0b0000_0111), 0xFF);
    assert_eq!(Color::expand_channel(0b1111_1100), 0x00);
  }

  #[test]
  fn rgb8_expands_each_channel() {
    let color = Color { r: 3, g: 0, b: 1 };
    assert_eq!(color.to_rgb8(), [0xFF, 0x00, 0x7F]);
    assert_eq!(color.channels(), (3, 0, 1));
  }
}

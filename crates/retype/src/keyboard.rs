use anyhow::Result;

/// Something that accepts synthetic key events by Linux key code.
pub trait KeyboardDevice {
    fn key_down(&mut self, code: u32) -> Result<()>;

    fn key_up(&mut self, code: u32) -> Result<()>;

    /// Press and release a key as one action.
    fn key_press(&mut self, code: u32) -> Result<()> {
        self.key_down(code)?;
        self.key_up(code)
    }
}

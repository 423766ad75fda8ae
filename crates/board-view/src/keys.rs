/// Keys the detail view reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Previous,
    Next,
    First,
    Last,
    Flip,
}

pub fn command_for(key: Key) -> Option<NavCommand> {
    match key {
        Key::Left => Some(NavCommand::Previous),
        Key::Right => Some(NavCommand::Next),
        Key::Up | Key::Home => Some(NavCommand::First),
        Key::Down | Key::End => Some(NavCommand::Last),
        Key::Char('f') | Key::Char('F') => Some(NavCommand::Flip),
        Key::Char(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings() {
        assert_eq!(command_for(Key::Left), Some(NavCommand::Previous));
        assert_eq!(command_for(Key::Right), Some(NavCommand::Next));
        assert_eq!(command_for(Key::Up), Some(NavCommand::First));
        assert_eq!(command_for(Key::End), Some(NavCommand::Last));
        assert_eq!(command_for(Key::Char('F')), Some(NavCommand::Flip));
        assert_eq!(command_for(Key::Char('x')), None);
    }
}

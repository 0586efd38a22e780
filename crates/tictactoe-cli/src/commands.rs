//! Input Commands

use std::str::FromStr;

use tictactoe::Difficulty;

/// A line typed at the prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move { row: usize, col: usize },
    Show,
    Log,
    Reset,
    Difficulty(Difficulty),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .collect();

        match words.as_slice() {
            ["show" | "board"] => Ok(Self::Show),
            ["log" | "memory"] => Ok(Self::Log),
            ["reset" | "restart"] => Ok(Self::Reset),
            ["help" | "?"] => Ok(Self::Help),
            ["quit" | "exit" | "q"] => Ok(Self::Quit),
            ["difficulty", level] => level
                .parse()
                .map(Self::Difficulty)
                .map_err(|e: tictactoe::GameError| e.to_string()),
            [row, col] => match (row.parse(), col.parse()) {
                (Ok(row), Ok(col)) => Ok(Self::Move { row, col }),
                _ => Err(format!("'{line}' is not a cell, expected two numbers like `1 2`")),
            },
            _ => Err(format!("unknown command '{}', type `help`", line.trim())),
        }
    }
}

pub const HELP: &str = "\
Commands:
  <row> <col>          place your mark, e.g. `1 2`
  show                 print the board
  log                  print the agent transcript
  difficulty <level>   easy | medium | hard
  reset                start over
  quit                 leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("1 2".parse(), Ok(Command::Move { row: 1, col: 2 }));
        assert_eq!(" 0,3 ".parse(), Ok(Command::Move { row: 0, col: 3 }));
        assert_eq!("show".parse(), Ok(Command::Show));
        assert_eq!("difficulty hard".parse(), Ok(Command::Difficulty(Difficulty::Hard)));
        assert_eq!("q".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!("1 x".parse::<Command>().unwrap_err().contains("not a cell"));
        assert!("difficulty extreme".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().unwrap_err().contains("unknown command"));
        assert!("".parse::<Command>().is_err());
    }
}

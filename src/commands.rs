/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "students",
    aliases: &["s", "student"],
    description: "Browse students",
  },
  Command {
    name: "programs",
    aliases: &["p", "program"],
    description: "Browse programs",
  },
  Command {
    name: "colleges",
    aliases: &["c", "college"],
    description: "Browse colleges",
  },
  Command {
    name: "reset",
    aliases: &["clear"],
    description: "Clear search, filters and sort",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Re-fetch the current page",
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Sign out and exit",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit ssis",
  },
];

/// Get autocomplete suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input).map(|rank| (cmd, rank)))
    .collect();

  // Stable, so ties keep declaration order
  matches.sort_by_key(|(_, rank)| *rank);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better. `None` when nothing matches.
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

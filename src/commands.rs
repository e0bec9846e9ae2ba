/// Available commands and autocomplete logic
#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Whether the command accepts an argument (e.g. a project id)
  pub takes_arg: bool,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "report",
    aliases: &["r", "sprint", "sprints"],
    description: "Sprint report for the default project",
    takes_arg: false,
  },
  Command {
    name: "project",
    aliases: &["p", "proj"],
    description: "Sprint report for a given project id",
    takes_arg: true,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit z9s",
    takes_arg: false,
  },
];

/// Get autocomplete suggestions for a given input.
///
/// Matching only considers the first word; once an argument is being typed
/// only exact command matches remain so the overlay doesn't flicker.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim_start();
  let (head, rest) = match input.split_once(char::is_whitespace) {
    Some((head, rest)) => (head.to_lowercase(), Some(rest)),
    None => (input.to_lowercase(), None),
  };

  if head.is_empty() {
    return COMMANDS.iter().collect();
  }

  if rest.is_some() {
    return COMMANDS
      .iter()
      .filter(|cmd| cmd.name == head || cmd.aliases.contains(&head.as_str()))
      .collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    let priority = if cmd.name == head {
      0
    } else if cmd.aliases.contains(&head.as_str()) {
      1
    } else if cmd.name.starts_with(&head) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&head)) {
      3
    } else if cmd.name.contains(&head) {
      4
    } else if cmd.aliases.iter().any(|a| a.contains(&head)) {
      5
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Split a command line into its command word and optional argument.
pub fn parse_command(input: &str) -> (String, Option<String>) {
  let input = input.trim();
  match input.split_once(char::is_whitespace) {
    Some((head, rest)) => (head.to_lowercase(), Some(rest.trim().to_string())),
    None => (input.to_lowercase(), None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("report");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "report");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("p");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "project");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("rep");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "report");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("por");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "report");
  }

  #[test]
  fn test_argument_keeps_exact_command_only() {
    let suggestions = get_suggestions("project PROJ-1");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].name, "project");

    assert!(get_suggestions("bogus PROJ-1").is_empty());
  }

  #[test]
  fn test_parse_command_with_argument() {
    assert_eq!(
      parse_command("project PROJ-1"),
      ("project".to_string(), Some("PROJ-1".to_string()))
    );
    assert_eq!(parse_command("quit"), ("quit".to_string(), None));
    assert_eq!(
      parse_command("  Project   ops-tools  "),
      ("project".to_string(), Some("ops-tools".to_string()))
    );
  }
}

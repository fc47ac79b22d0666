//! Property-based tests for rust_logging using proptest

use proptest::prelude::*;
use rust_logging::prelude::*;
use rust_logging::level_name;
use std::sync::Arc;

fn standard_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::DEBUG),
        Just(Level::INFO),
        Just(Level::WARNING),
        Just(Level::ERROR),
        Just(Level::CRITICAL),
    ]
}

fn logger_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-c]{1,2}", 1..5)
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Standard level names parse back to the same level
    #[test]
    fn test_level_name_roundtrip(level in standard_level()) {
        let parsed: Level = level.name().parse().unwrap();
        prop_assert_eq!(parsed, level);
        prop_assert_eq!(parsed.name().to_lowercase().parse::<Level>().unwrap(), level);
    }

    /// Integers that are not standard levels render a blank name
    #[test]
    fn test_custom_levels_render_blank(value in 0u32..200) {
        let name = level_name(Level::new(value));
        if value % 10 == 0 && value <= 50 {
            prop_assert!(!name.is_empty());
        } else {
            prop_assert_eq!(name, "");
        }
        prop_assert_eq!(value.to_string().parse::<Level>().unwrap(), Level::new(value));
    }
}

// ============================================================================
// Hierarchy Tests
// ============================================================================

proptest! {
    /// The effective level is the first explicit level walking towards the root,
    /// whatever order the loggers were created and configured in
    #[test]
    fn test_effective_level_is_nearest_explicit(
        path in logger_path(),
        levels in prop::collection::vec(prop::option::of(standard_level()), 1..5),
        reverse in any::<bool>(),
    ) {
        let manager = Manager::new();
        let names: Vec<String> = (1..=path.len()).map(|n| path[..n].join(".")).collect();

        let order: Vec<&String> = if reverse {
            names.iter().rev().collect()
        } else {
            names.iter().collect()
        };
        for name in order {
            manager.get_logger(name);
        }
        for (name, level) in names.iter().zip(levels.iter()) {
            if let Some(level) = level {
                manager.get_logger(name).set_level(*level);
            }
        }

        let leaf = manager.get_logger(names.last().unwrap());
        let expected = levels
            .iter()
            .take(names.len())
            .rev()
            .find_map(|level| *level)
            .unwrap_or(Level::WARNING);
        prop_assert_eq!(leaf.effective_level(), expected);
    }

    /// A logger's parent is always its nearest existing ancestor
    #[test]
    fn test_parent_is_nearest_existing_ancestor(
        paths in prop::collection::vec(logger_path(), 1..8),
    ) {
        let manager = Manager::new();
        for path in &paths {
            manager.get_logger(&path.join("."));
        }
        let existing = manager.logger_names();
        for name in &existing {
            let logger = manager.get_logger(name);
            let parent = logger.parent().unwrap();
            let mut expected = "root".to_string();
            let mut prefix = name.as_str();
            while let Some(idx) = prefix.rfind('.') {
                prefix = &prefix[..idx];
                if existing.iter().any(|n| n == prefix) {
                    expected = prefix.to_string();
                    break;
                }
            }
            prop_assert_eq!(parent.name(), expected.as_str());
        }
    }
}

// ============================================================================
// Formatter Tests
// ============================================================================

proptest! {
    /// Messages without arguments are rendered literally, `%` included
    #[test]
    fn test_no_args_renders_literally(msg in "[ -~]{0,40}") {
        let formatter = Formatter::new("%(message)s").unwrap();
        let record = Record::new("prop", Level::INFO, msg.clone());
        prop_assert_eq!(formatter.format(&record).unwrap(), msg);
    }

    /// Formatting the same record twice yields the same text
    #[test]
    fn test_format_idempotent(
        msg in "[a-z ]{0,20}",
        name in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}",
        level in standard_level(),
    ) {
        let formatter = Formatter::new("%(asctime)s|%(name)s|%(levelname)s|%(message)s").unwrap();
        let record = Record::new(name, level, msg);
        prop_assert_eq!(formatter.format(&record).unwrap(), formatter.format(&record).unwrap());
    }

    /// All three styles agree on the same fields
    #[test]
    fn test_styles_agree(msg in "[a-zA-Z0-9 ]{0,30}", level in standard_level()) {
        let record = Record::new("styles", level, msg);
        let percent = Formatter::new("%(levelname)s:%(message)s").unwrap();
        let brace = Formatter::builder().format("{levelname}:{message}").style(Style::Brace).build().unwrap();
        let dollar = Formatter::builder().format("${levelname}:${message}").style(Style::Template).build().unwrap();
        let expected = percent.format(&record).unwrap();
        prop_assert_eq!(brace.format(&record).unwrap(), expected.clone());
        prop_assert_eq!(dollar.format(&record).unwrap(), expected);
    }

    /// Integer arguments expand like printf
    #[test]
    fn test_integer_expansion(a in any::<i32>(), b in any::<i32>()) {
        let record = Record::new("args", Level::INFO, "%d/%5d").with_args(vec![Value::from(a), Value::from(b)]);
        prop_assert_eq!(record.get_message().unwrap(), format!("{}/{:>5}", a, b));
    }
}

// ============================================================================
// Filter Tests
// ============================================================================

proptest! {
    /// A name filter accepts exactly the logger and its dotted descendants
    #[test]
    fn test_name_filter(filter_name in "[a-c]{1,3}", record_name in "[a-c]{1,3}(\\.[a-c]{1,3}){0,2}") {
        let filter = NameFilter::new(filter_name.clone());
        let record = Record::new(record_name.clone(), Level::INFO, "x");
        let expected = record_name == filter_name || record_name.starts_with(&format!("{}.", filter_name));
        prop_assert_eq!(filter.filter(&record), expected);
    }

    /// Handlers deliver a record only when every filter accepts it
    #[test]
    fn test_handler_filter_chain(accepts in prop::collection::vec(any::<bool>(), 0..4)) {
        let handler = Handler::new(NullSink);
        for accept in &accepts {
            let accept = *accept;
            handler.add_filter(Arc::new(move |_: &Record| accept));
        }
        let delivered = handler.handle(&Record::new("chain", Level::INFO, "x"));
        prop_assert_eq!(delivered, accepts.iter().all(|a| *a));
        prop_assert_eq!(handler.metrics().emitted_count(), u64::from(delivered));
    }
}

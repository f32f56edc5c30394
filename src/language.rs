//! Per-language capability descriptors.
//!
//! Each target language the driver can generate for is described by one
//! [`Language`] entry: its protoc plugin, how its output tree is laid out,
//! and how transport (gRPC) stubs are requested on the protoc command line.
//! Everything downstream (staleness heuristics, output directory shape,
//! argv construction) keys off these descriptors instead of comparing
//! language-id strings in scattered conditionals.

/// How a language's generator lays out its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputLayout {
    /// Output is namespaced per source file under
    /// `<gen_root>/<lang>/<synthetic-path>/`.
    Nested,
    /// The generator ignores nested output paths and writes its own
    /// package-derived hierarchy directly under `<gen_root>/<lang>/`.
    /// Staleness is detected by searching for the expected file name
    /// anywhere in that subtree.
    Flat,
}

/// How transport (gRPC) stub generation is requested from protoc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportStyle {
    /// The language's own plugin is registered with `--plugin=<path>` and
    /// transport generation is folded into the output flag value:
    /// `--<lang>_out=plugins=grpc:<dir>`.
    Folded,
    /// Transport uses a separate plugin/output flag pair:
    /// `--plugin=protoc-gen-grpc=<path> --grpc_out=<dir>`.
    SeparatePlugin,
}

/// Capability descriptor for one target language.
#[derive(Clone, Copy, Debug)]
pub struct Language {
    /// The identifier used in configuration and protoc flags ("cpp", "go", ...).
    pub id: &'static str,
    /// Human-readable name for progress output.
    pub pretty: &'static str,
    /// Executable name of the generator plugin, without platform suffix.
    pub plugin: &'static str,
    pub layout: OutputLayout,
    pub transport: TransportStyle,
    /// The file extension the generator emits for this language, used by
    /// Flat-layout presence checks.
    pub source_ext: &'static str,
}

/// Every language the driver knows how to generate for.
///
/// A language named in the configuration but absent here is skipped with a
/// warning; the run proceeds for the rest.
pub const LANGUAGES: &[Language] = &[
    Language {
        id: "cpp",
        pretty: "C++",
        plugin: "grpc_cpp_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "cc",
    },
    Language {
        id: "csharp",
        pretty: "C#",
        plugin: "grpc_csharp_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "cs",
    },
    Language {
        id: "js",
        pretty: "JavaScript",
        plugin: "grpc_node_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "js",
    },
    Language {
        id: "objc",
        pretty: "Objective C",
        plugin: "grpc_objective_c_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "m",
    },
    Language {
        id: "php",
        pretty: "PHP",
        plugin: "grpc_php_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "php",
    },
    Language {
        id: "python",
        pretty: "Python",
        plugin: "grpc_python_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "py",
    },
    Language {
        id: "ruby",
        pretty: "Ruby",
        plugin: "grpc_ruby_plugin",
        layout: OutputLayout::Nested,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "rb",
    },
    Language {
        id: "go",
        pretty: "Golang",
        plugin: "protoc-gen-go",
        layout: OutputLayout::Nested,
        transport: TransportStyle::Folded,
        source_ext: "go",
    },
    Language {
        id: "java",
        pretty: "Java",
        plugin: "protoc-gen-grpc-java",
        layout: OutputLayout::Flat,
        transport: TransportStyle::SeparatePlugin,
        source_ext: "java",
    },
];

/// Looks up the descriptor for a configured language id.
pub fn lookup(id: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|lang| lang.id == id)
}

/// Appends the platform executable suffix to a program name.
pub fn exec_name(program: &str) -> String {
    if cfg!(windows) {
        format!("{program}.exe")
    } else {
        program.to_string()
    }
}

/// Converts a snake_case proto base name to the UpperCamelCase file name
/// Java generators emit for it.
pub fn to_camel_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("go").unwrap().pretty, "Golang");
        assert_eq!(lookup("cpp").unwrap().plugin, "grpc_cpp_plugin");
        assert!(lookup("fortran").is_none());
    }

    #[test]
    fn test_java_is_the_only_flat_language() {
        let flat: Vec<_> = LANGUAGES
            .iter()
            .filter(|l| l.layout == OutputLayout::Flat)
            .collect();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].id, "java");
    }

    #[test]
    fn test_go_folds_transport_into_out_flag() {
        assert_eq!(lookup("go").unwrap().transport, TransportStyle::Folded);
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("user_service"), "UserService");
        assert_eq!(to_camel_case("echo"), "Echo");
        assert_eq!(to_camel_case("a_b_c"), "ABC");
        assert_eq!(to_camel_case(""), "");
    }
}

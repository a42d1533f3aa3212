//! End-to-end binding behavior through the public API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use cmdbind_core::*;
use rayon::prelude::*;

fn int_seq(values: &[i64]) -> BoundValue {
    BoundValue::Many(values.iter().copied().map(Value::Int).collect())
}

#[test]
fn rendered_values_parse_back() {
    let registry = ParserRegistry::with_builtins();
    let samples = [
        ("int", Value::Int(-17)),
        ("int", Value::Int(i64::MAX)),
        ("double", Value::Float(123.0)),
        ("double", Value::Float(-0.125)),
        ("bool", Value::Bool(true)),
        ("bool", Value::Bool(false)),
        ("string", Value::String("hello world".into())),
        ("path", Value::Path(PathBuf::from("/var/log/app.log"))),
        (
            "endpoint",
            Value::Endpoint("[::1]:8443".parse::<SocketAddr>().unwrap()),
        ),
    ];

    for (type_name, value) in samples {
        let parser = registry.get(type_name).unwrap();
        let rendered = value.render();
        let tokens = [rendered.as_str()];
        let (width, parsed) = parser.parse(TokenStream::new(&tokens)).unwrap();
        assert_eq!(width, 1, "{type_name}");
        assert_eq!(parsed, value, "{type_name}");
    }
}

#[test]
fn many_arity_accumulates_in_order() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("x", "int").with_arity(Arity::ZeroOrMany))
        .build()
        .unwrap();

    let bound = schema.bind(&["--x", "1", "--x", "2", "--x", "3"]).unwrap();
    assert_eq!(bound.get("x"), Some(&int_seq(&[1, 2, 3])));

    let bound = schema.bind::<&str>(&[]).unwrap();
    assert_eq!(bound.get("x"), Some(&int_seq(&[])));
}

#[test]
fn positional_binds_by_slot_or_by_name() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("n", "int").at_position(0))
        .build()
        .unwrap();

    let by_slot = schema.bind(&["42"]).unwrap();
    let by_name = schema.bind(&["--n", "42"]).unwrap();
    assert_eq!(by_slot.value::<i64>("n").unwrap(), 42);
    assert_eq!(by_name.value::<i64>("n").unwrap(), 42);

    let negative = schema.bind(&["--n", "-5"]).unwrap();
    assert_eq!(negative.value::<i64>("n").unwrap(), -5);
}

#[test]
fn repeated_flag_is_a_duplicate() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("Value1", "bool"))
        .build()
        .unwrap();

    let errors = schema.bind(&["--Value1", "--Value1"]).unwrap_err();
    assert_eq!(
        errors.into_vec(),
        vec![BindError::DuplicateArgument("Value1".into())]
    );
}

#[test]
fn all_missing_arguments_are_reported_together() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("a", "int"))
        .declare(ArgumentDecl::new("b", "int"))
        .build()
        .unwrap();

    let errors = schema.bind::<&str>(&[]).unwrap_err();
    assert_eq!(
        errors.errors(),
        &[
            BindError::MissingMandatoryArgument("a".into()),
            BindError::MissingMandatoryArgument("b".into()),
        ]
    );
    assert!(!errors.is_help_request());
}

#[test]
fn variadic_positional_must_be_last() {
    let err = SchemaBuilder::new()
        .declare(
            ArgumentDecl::new("rest", "int")
                .at_position(0)
                .with_arity(Arity::ZeroOrMany),
        )
        .declare(ArgumentDecl::new("head", "int").at_position(1))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::VariadicPositionalNotLast {
            name: "rest".into(),
            index: 0
        }
    );

    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("head", "int").at_position(0))
        .declare(
            ArgumentDecl::new("rest", "int")
                .at_position(1)
                .with_arity(Arity::ZeroOrMany),
        )
        .build()
        .unwrap();
    let bound = schema.bind(&["456", "1", "2", "3"]).unwrap();
    assert_eq!(bound.value::<i64>("head").unwrap(), 456);
    assert_eq!(bound.value::<Vec<i64>>("rest").unwrap(), vec![1, 2, 3]);
}

#[test]
fn unknown_option_stops_the_scan() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("a", "int"))
        .build()
        .unwrap();

    let errors = schema.bind(&["--nonexistent", "--a", "oops", "--help"]).unwrap_err();
    assert_eq!(
        errors.into_vec(),
        vec![BindError::UnknownOption("--nonexistent".into())]
    );
}

#[test]
fn flag_presence_flips_its_default() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("color", "bool").with_default(true))
        .declare(ArgumentDecl::new("verbose", "bool").with_short("v"))
        .build()
        .unwrap();

    let absent = schema.bind::<&str>(&[]).unwrap();
    assert!(absent.value::<bool>("color").unwrap());
    assert!(!absent.value::<bool>("verbose").unwrap());

    let present = schema.bind(&["--color", "-v"]).unwrap();
    assert!(!present.value::<bool>("color").unwrap());
    assert!(present.value::<bool>("verbose").unwrap());
}

#[test]
fn help_wins_over_later_errors() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("a", "int"))
        .build()
        .unwrap();

    let errors = schema.bind(&["-h", "--nonexistent"]).unwrap_err();
    assert!(errors.is_help_request());
    assert_eq!(errors.exit_code(), 0);
}

#[test]
fn custom_parser_registered_by_type_name() {
    let registry = ParserRegistry::with_builtins().with_parser(
        "Port",
        Arc::new(TokenParser::new(ValueKind::Int, |token| {
            token
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .map(|port| Value::Int(i64::from(port)))
        })),
    );
    let schema = SchemaBuilder::new()
        .with_registry(registry)
        .declare(ArgumentDecl::new("port", "port").with_short("p"))
        .build()
        .unwrap();

    let bound = schema.bind(&["-p", "8080"]).unwrap();
    assert_eq!(bound.value::<u16>("port").unwrap(), 8080);

    let errors = schema.bind(&["-p", "70000"]).unwrap_err();
    assert_eq!(
        errors.into_vec(),
        vec![BindError::InvalidFormat {
            token: "70000".into(),
            expected: "Integer".into(),
        }]
    );
}

#[test]
fn shared_schema_binds_concurrently() {
    let schema = SchemaBuilder::new()
        .declare(ArgumentDecl::new("n", "int").at_position(0))
        .declare(
            ArgumentDecl::new("tag", "string")
                .with_short("t")
                .with_arity(Arity::ZeroOrMany),
        )
        .build()
        .unwrap();

    let results: Vec<(i64, usize)> = (0..256i64)
        .into_par_iter()
        .map(|n| {
            let count = (n % 4) as usize;
            let mut tokens = vec![n.to_string()];
            for i in 0..count {
                tokens.push("-t".to_string());
                tokens.push(format!("tag{i}"));
            }
            let bound = schema.bind(&tokens).unwrap();
            let tags: Vec<String> = bound.value("tag").unwrap();
            (bound.value::<i64>("n").unwrap(), tags.len())
        })
        .collect();

    for (n, (bound_n, tags)) in results.into_iter().enumerate() {
        assert_eq!(bound_n, n as i64);
        assert_eq!(tags, n % 4);
    }
}

#[derive(Debug, PartialEq)]
struct Fetch {
    url: String,
    retries: i64,
    output: Option<PathBuf>,
}

impl Arguments for Fetch {
    fn declare(builder: SchemaBuilder) -> SchemaBuilder {
        builder
            .program("fetch")
            .declare(ArgumentDecl::new("url", "string").at_position(0))
            .declare(ArgumentDecl::new("retries", "int").with_default(3i64))
            .declare(
                ArgumentDecl::new("output", "path")
                    .with_short("o")
                    .with_arity(Arity::ZeroOrOne),
            )
    }

    fn assemble(values: &BoundValues<'_>) -> Result<Self, AssembleError> {
        Ok(Self {
            url: values.value("url")?,
            retries: values.value("retries")?,
            output: values.value("output")?,
        })
    }
}

#[test]
fn command_line_is_shareable_across_threads() {
    let command_line = CommandLine::<Fetch>::for_type().unwrap();

    let fetched: Vec<Fetch> = ["a", "b", "c"]
        .par_iter()
        .map(|url| command_line.parse(&[*url, "--retries", "5"]).unwrap())
        .collect();
    assert_eq!(fetched.len(), 3);
    assert!(fetched.iter().all(|fetch| fetch.retries == 5 && fetch.output.is_none()));

    let fetch = command_line.parse(&["https://example.org", "-o", "page.html"]).unwrap();
    assert_eq!(
        fetch,
        Fetch {
            url: "https://example.org".into(),
            retries: 3,
            output: Some(PathBuf::from("page.html")),
        }
    );
    assert!(command_line.help().starts_with("fetch --url <String>\n"));
}

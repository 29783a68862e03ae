use std::error::Error;

use tagwire::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SCHEMA: &str = include_str!("../schema/address_book.json");

// ---------------------------------------------------------------------------
// Building messages
// ---------------------------------------------------------------------------

fn person(
    codec: &Codec<'_>,
    name: &str,
    id: i32,
    email: Option<&str>,
    phones: &[(&str, Option<&str>)],
) -> tagwire::Result<DynamicMessage> {
    let people = codec.message("Person")?;
    let numbers = codec.message("Person.PhoneNumber")?;
    let phone_type = codec.enum_type("Person.PhoneType")?;

    let mut msg = people.new_message();
    people.set(&mut msg, "name", name)?;
    people.set(&mut msg, "id", ScalarValue::Int32(id))?;
    if let Some(email) = email {
        people.set(&mut msg, "email", email)?;
    }
    for &(number, kind) in phones {
        let mut phone = numbers.new_message();
        numbers.set(&mut phone, "number", number)?;
        if let Some(constant) = kind.and_then(|k| phone_type.by_name(k)) {
            numbers.set(&mut phone, "type", Value::Enum(phone_type.to_int(constant)))?;
        }
        people.push(&mut msg, "phone", phone)?;
    }
    Ok(msg)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Optional codec settings: `address-book config.json`.
    let config = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => CodecConfig::default(),
    };

    let schema = Schema::from_json(SCHEMA)?;
    let codec = Codec::with_config(&schema, config);
    let books = codec.message("AddressBook")?;
    let people = codec.message("Person")?;
    let numbers = codec.message("Person.PhoneNumber")?;
    let phone_type = codec.enum_type("Person.PhoneType")?;

    let mut book = books.new_message();
    books.push(
        &mut book,
        "people",
        person(&codec, "Alice", 1, Some("alice@example.com"), &[("555-0100", Some("WORK"))])?,
    )?;
    books.push(
        &mut book,
        "people",
        person(&codec, "Bob", 2, None, &[("555-0199", None), ("555-0142", Some("MOBILE"))])?,
    )?;

    let bytes = books.encode(&book)?;
    info!(size = books.size(&book), encoded = bytes.len(), "encoded address book");
    println!("{}", hex(&bytes));

    let decoded = books.decode(&bytes)?;
    for entry in books.repeated(&decoded, "people")? {
        let Some(p) = entry.as_message() else { continue };
        let name = people.get(p, "name")?.and_then(Value::as_str).unwrap_or_default();
        let email = people.get(p, "email")?.and_then(Value::as_str).unwrap_or("-");
        println!("{name} <{email}>");
        for phone in people.repeated(p, "phone")? {
            let Some(phone) = phone.as_message() else { continue };
            let number = numbers.get(phone, "number")?.and_then(Value::as_str).unwrap_or_default();
            let kind = numbers
                .get_or_default(phone, "type")?
                .as_enum()
                .and_then(|n| phone_type.from_int(n))
                .map_or("?", |c| c.name.as_str());
            println!("  {number} ({kind})");
        }
    }

    // An older reader that only knows `name` and `id` keeps the rest as
    // unknown fields and writes them back unchanged.
    let older = Schema::builder()
        .add(
            MessageDescriptor::new("Person")
                .field(FieldDescriptor::required("name", 1, ScalarType::String))
                .field(FieldDescriptor::required("id", 2, ScalarType::Int32)),
        )
        .build()?;
    let older_codec = Codec::new(&older);
    let older_people = older_codec.message("Person")?;

    let alice = people.encode(&person(
        &codec,
        "Alice",
        1,
        Some("alice@example.com"),
        &[("555-0100", Some("WORK"))],
    )?)?;
    let narrowed = older_people.decode(&alice)?;
    let reencoded = older_people.encode(&narrowed)?;
    info!(
        unknown = narrowed.unknown_fields().len(),
        preserved = reencoded == alice,
        "older reader round trip"
    );

    Ok(())
}

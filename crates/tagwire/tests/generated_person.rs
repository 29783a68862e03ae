//! A statically typed `Person`, written the way generated code would be,
//! checked byte-for-byte against the dynamic codec on the same schema.

use tagwire::bytes::BufMut;
use tagwire::codec::{
    decode_fields, decode_nested, encode_message_with_tag, message_len_with_tag, required,
    FieldOutcome,
};
use tagwire::prelude::*;
use tagwire::wire::{
    encode_varint, encoded_len_varint, key_len, length_delimited_len, Key, WireReader, WireType,
};
use tagwire::{CodecError, WireError};

// =========================================================================
// Typed messages
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhoneType {
    Mobile = 0,
    Home = 1,
    Work = 2,
}

impl PhoneType {
    fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Mobile),
            1 => Some(Self::Home),
            2 => Some(Self::Work),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PhoneNumber {
    number: String,
    kind: Option<PhoneType>,
    unknown_fields: UnknownFields,
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    id: i32,
    email: Option<String>,
    phone: Vec<PhoneNumber>,
    unknown_fields: UnknownFields,
}

fn string_len(tag: u32, s: &str) -> usize {
    key_len(tag) + length_delimited_len(s.len())
}

fn write_string<B: BufMut + ?Sized>(tag: u32, s: &str, buf: &mut B) {
    Key::new(tag, WireType::LengthDelimited).encode(buf);
    encode_varint(s.len() as u64, buf);
    buf.put_slice(s.as_bytes());
}

fn read_string(reader: &mut WireReader<'_>) -> Result<String, CodecError> {
    let raw = reader.read_length_delimited()?;
    let s = std::str::from_utf8(raw).map_err(|_| WireError::InvalidUtf8)?;
    Ok(s.to_owned())
}

fn mismatch(message: &str, field: &str, expected: WireType, actual: WireType) -> CodecError {
    CodecError::WireTypeMismatch {
        message: message.to_owned(),
        field: field.to_owned(),
        expected,
        actual,
    }
}

impl Message for PhoneNumber {
    fn encoded_len(&self) -> usize {
        let kind = self
            .kind
            .map_or(0, |k| key_len(2) + encoded_len_varint(i64::from(k as i32) as u64));
        string_len(1, &self.number) + kind + self.unknown_fields.len()
    }

    fn encode_raw<B: BufMut + ?Sized>(&self, buf: &mut B) {
        write_string(1, &self.number, buf);
        if let Some(kind) = self.kind {
            Key::new(2, WireType::Varint).encode(buf);
            encode_varint(i64::from(kind as i32) as u64, buf);
        }
        buf.put_slice(&self.unknown_fields);
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut number = None;
        let mut kind = None;
        let unknown_fields = decode_fields(data, |key, reader| {
            match (key.tag, key.wire_type) {
                (1, WireType::LengthDelimited) => number = Some(read_string(reader)?),
                (1, actual) => {
                    let expected = WireType::LengthDelimited;
                    return Err(mismatch("Person.PhoneNumber", "number", expected, actual));
                }
                (2, WireType::Varint) => {
                    // Peek so an undeclared value can be left for the
                    // unknown-field buffer.
                    let mut peek = reader.clone();
                    match PhoneType::from_i32(peek.read_varint()? as i32) {
                        Some(k) => {
                            kind = Some(k);
                            *reader = peek;
                        }
                        None => return Ok(FieldOutcome::Unknown),
                    }
                }
                (2, actual) => {
                    return Err(mismatch("Person.PhoneNumber", "type", WireType::Varint, actual));
                }
                _ => return Ok(FieldOutcome::Unknown),
            }
            Ok(FieldOutcome::Consumed)
        })?;
        Ok(PhoneNumber {
            number: required(number, "Person.PhoneNumber", "number")?,
            kind,
            unknown_fields,
        })
    }
}

impl Message for Person {
    fn encoded_len(&self) -> usize {
        string_len(1, &self.name)
            + key_len(2)
            + encoded_len_varint(i64::from(self.id) as u64)
            + self.email.as_deref().map_or(0, |e| string_len(3, e))
            + self.phone.iter().map(|p| message_len_with_tag(4, p)).sum::<usize>()
            + self.unknown_fields.len()
    }

    fn encode_raw<B: BufMut + ?Sized>(&self, buf: &mut B) {
        write_string(1, &self.name, buf);
        Key::new(2, WireType::Varint).encode(buf);
        encode_varint(i64::from(self.id) as u64, buf);
        if let Some(email) = &self.email {
            write_string(3, email, buf);
        }
        for phone in &self.phone {
            encode_message_with_tag(4, phone, buf);
        }
        buf.put_slice(&self.unknown_fields);
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut name = None;
        let mut id = None;
        let mut email = None;
        let mut phone = Vec::new();
        let unknown_fields = decode_fields(data, |key, reader| {
            match (key.tag, key.wire_type) {
                (1, WireType::LengthDelimited) => name = Some(read_string(reader)?),
                (2, WireType::Varint) => id = Some(reader.read_varint()? as i32),
                (3, WireType::LengthDelimited) => email = Some(read_string(reader)?),
                (4, WireType::LengthDelimited) => phone.push(decode_nested(reader)?),
                (tag @ 1..=4, actual) => {
                    let (field, expected) = match tag {
                        1 => ("name", WireType::LengthDelimited),
                        2 => ("id", WireType::Varint),
                        3 => ("email", WireType::LengthDelimited),
                        _ => ("phone", WireType::LengthDelimited),
                    };
                    return Err(mismatch("Person", field, expected, actual));
                }
                _ => return Ok(FieldOutcome::Unknown),
            }
            Ok(FieldOutcome::Consumed)
        })?;
        Ok(Person {
            name: required(name, "Person", "name")?,
            id: required(id, "Person", "id")?,
            email,
            phone,
            unknown_fields,
        })
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn schema() -> Schema {
    Schema::builder()
        .add(
            MessageDescriptor::new("Person")
                .field(FieldDescriptor::required("name", 1, ScalarType::String))
                .field(FieldDescriptor::required("id", 2, ScalarType::Int32))
                .field(FieldDescriptor::optional("email", 3, ScalarType::String))
                .field(FieldDescriptor::repeated(
                    "phone",
                    4,
                    FieldType::Message("PhoneNumber".into()),
                ))
                .nested(
                    EnumDescriptor::new("PhoneType")
                        .constant("MOBILE", 0)
                        .constant("HOME", 1)
                        .constant("WORK", 2),
                )
                .nested(
                    MessageDescriptor::new("PhoneNumber")
                        .field(FieldDescriptor::required("number", 1, ScalarType::String))
                        .field(
                            FieldDescriptor::optional("type", 2, FieldType::Enum("PhoneType".into()))
                                .with_default("HOME"),
                        ),
                ),
        )
        .build()
        .unwrap()
}

fn alice() -> Person {
    Person {
        name: "Alice".into(),
        id: -7,
        email: Some("alice@example.com".into()),
        phone: vec![
            PhoneNumber {
                number: "555-0100".into(),
                kind: Some(PhoneType::Work),
                unknown_fields: UnknownFields::new(),
            },
            PhoneNumber {
                number: "555-0199".into(),
                kind: None,
                unknown_fields: UnknownFields::new(),
            },
        ],
        unknown_fields: UnknownFields::new(),
    }
}

fn alice_dynamic(codec: &Codec<'_>) -> DynamicMessage {
    let people = codec.message("Person").unwrap();
    let phones = codec.message("Person.PhoneNumber").unwrap();

    let mut msg = people.new_message();
    people.set(&mut msg, "name", "Alice").unwrap();
    people.set(&mut msg, "id", ScalarValue::Int32(-7)).unwrap();
    people.set(&mut msg, "email", "alice@example.com").unwrap();

    let mut work = phones.new_message();
    phones.set(&mut work, "number", "555-0100").unwrap();
    phones.set(&mut work, "type", Value::Enum(2)).unwrap();
    people.push(&mut msg, "phone", work).unwrap();

    let mut plain = phones.new_message();
    phones.set(&mut plain, "number", "555-0199").unwrap();
    people.push(&mut msg, "phone", plain).unwrap();
    msg
}

// =========================================================================
// Equivalence
// =========================================================================

#[test]
fn test_typed_and_dynamic_encodings_match() {
    let schema = schema();
    let codec = Codec::new(&schema);
    let people = codec.message("Person").unwrap();

    let typed = alice();
    let dynamic = alice_dynamic(&codec);

    let typed_bytes = typed.encode_to_vec();
    assert_eq!(typed.encoded_len(), typed_bytes.len());
    assert_eq!(typed_bytes, people.encode(&dynamic).unwrap());
    assert_eq!(typed.encoded_len(), people.size(&dynamic));
}

#[test]
fn test_each_side_decodes_the_other() {
    let schema = schema();
    let codec = Codec::new(&schema);
    let people = codec.message("Person").unwrap();

    let from_dynamic = people.encode(&alice_dynamic(&codec)).unwrap();
    assert_eq!(Person::decode(&from_dynamic).unwrap(), alice());

    let from_typed = alice().encode_to_vec();
    assert_eq!(people.decode(&from_typed).unwrap(), alice_dynamic(&codec));
}

#[test]
fn test_unknown_fields_agree() {
    let schema = schema();
    let codec = Codec::new(&schema);
    let people = codec.message("Person").unwrap();

    let mut bytes = alice().encode_to_vec();
    // tag 9 fixed32, tag 10 string
    bytes.extend([0x4d, 1, 2, 3, 4, 0x52, 0x02, b'h', b'i']);

    let typed = Person::decode(&bytes).unwrap();
    let dynamic = people.decode(&bytes).unwrap();
    assert_eq!(typed.unknown_fields, *dynamic.unknown_fields());
    assert_eq!(typed.encode_to_vec(), bytes);
    assert_eq!(people.encode(&dynamic).unwrap(), bytes);
}

#[test]
fn test_unrecognized_enum_handled_alike() {
    let schema = schema();
    let codec = Codec::new(&schema);
    let phones = codec.message("Person.PhoneNumber").unwrap();

    // number = "1", type = 7
    let bytes = [0x0a, 0x01, b'1', 0x10, 0x07];
    let typed = PhoneNumber::decode(&bytes).unwrap();
    let dynamic = phones.decode(&bytes).unwrap();

    assert_eq!(typed.kind, None);
    assert_eq!(phones.get(&dynamic, "type").unwrap(), None);
    assert_eq!(&typed.unknown_fields[..], &[0x10, 0x07]);
    assert_eq!(typed.unknown_fields, *dynamic.unknown_fields());
}

#[test]
fn test_missing_required_reported_alike() {
    let schema = schema();
    let codec = Codec::new(&schema);
    let people = codec.message("Person").unwrap();

    let bytes = [0x0a, 0x01, b'X'];
    let typed = Person::decode(&bytes).unwrap_err();
    let dynamic = people.decode(&bytes).unwrap_err();
    assert_eq!(typed.to_string(), dynamic.to_string());
}

#[test]
fn test_facade_error_wraps_both_paths() {
    fn run(bytes: &[u8]) -> tagwire::Result<Person> {
        let schema = schema();
        let codec = Codec::new(&schema);
        codec.message("Person")?.decode(bytes)?;
        Ok(Person::decode(bytes)?)
    }

    let err = run(&[0x0a, 0x05]).unwrap_err();
    assert!(err.is_malformed());
    assert!(matches!(err, TagwireError::Codec(_)));
}

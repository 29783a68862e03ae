//! One schema shared by many tasks at once.

use std::sync::Arc;

use tagwire_codec::{Codec, Value};
use tagwire_schema::Schema;
use tagwire_wire::ScalarValue;

const TASKS: usize = 8;
const ROUNDS: usize = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_schema_across_tasks() {
    let schema = Arc::new(Schema::from_json(include_str!("fixtures/person.json")).unwrap());

    let mut handles = Vec::with_capacity(TASKS);
    for task in 0..TASKS {
        let schema = Arc::clone(&schema);
        handles.push(tokio::spawn(async move {
            let codec = Codec::new(&schema);
            let people = codec.message("Person").unwrap();
            let phones = codec.message("Person.PhoneNumber").unwrap();
            let mut encoded = Vec::with_capacity(ROUNDS);

            for round in 0..ROUNDS {
                let mut msg = people.new_message();
                people.set(&mut msg, "name", format!("task-{task}")).unwrap();
                people
                    .set(&mut msg, "id", ScalarValue::Int32((task * ROUNDS + round) as i32))
                    .unwrap();
                let mut phone = phones.new_message();
                phones.set(&mut phone, "number", round.to_string()).unwrap();
                phones.set(&mut phone, "type", Value::Enum((round % 3) as i32)).unwrap();
                people.push(&mut msg, "phone", phone).unwrap();

                let bytes = people.encode(&msg).unwrap();
                assert_eq!(people.decode(&bytes).unwrap(), msg);
                encoded.push(bytes);
            }
            encoded
        }));
    }

    // Bytes produced on the workers decode and re-encode the same here.
    let mut results = Vec::with_capacity(TASKS);
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    let codec = Codec::new(&schema);
    let people = codec.message("Person").unwrap();
    for (round, bytes) in results[0].iter().enumerate() {
        let msg = people.decode(bytes).unwrap();
        assert_eq!(
            people.get(&msg, "id").unwrap(),
            Some(&Value::from(ScalarValue::Int32(round as i32)))
        );
        assert_eq!(&people.encode(&msg).unwrap(), bytes);
    }
}

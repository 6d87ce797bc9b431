#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

use blocklist::{BlockedList as TestList, Error};

#[derive(Debug, Arbitrary)]
enum Command {
    Insert { pos: usize, value: i64 },
    InsertInRange { pos: u16, value: i64 },
    PushBack { value: i64 },
    PushFront { value: i64 },
    RemoveAt { pos: usize },
    RemoveInRange { pos: u16 },
    Get { pos: usize },
    GetInRange { pos: u16 },
    First,
    Last,
    Len,
    IsEmpty,
    Iter,
    Clear,
    Extend { values: Vec<i64> },
    Clone,
    CloneFrom { source: Vec<i64> },
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let Ok(capacity) = unstructured.int_in_range(2..=9usize) else {
        return;
    };
    let commands = match Vec::<Command>::arbitrary(&mut unstructured) {
        Ok(c) => c,
        Err(_) => return,
    };

    let mut list = TestList::with_block_capacity(capacity).unwrap();
    let mut model: Vec<i64> = Vec::new();

    for command in commands {
        list.validate_blocks();

        if std::env::var("RUST_BACKTRACE").is_ok() {
            println!("{command:?}");
        }

        match command {
            Command::Insert { pos, value } => {
                let res = list.insert(pos, value);
                if pos <= model.len() {
                    assert_eq!(res, Ok(()));
                    model.insert(pos, value);
                    assert_eq!(list.get(pos), Ok(value));
                } else {
                    assert_eq!(res, Err(Error::OutOfRange { pos, len: model.len() }));
                }
            }
            Command::InsertInRange { pos, value } => {
                let pos = pos as usize % (model.len() + 1);
                list.insert(pos, value).unwrap();
                model.insert(pos, value);
            }
            Command::PushBack { value } => {
                list.push_back(value).unwrap();
                model.push(value);
            }
            Command::PushFront { value } => {
                list.push_front(value).unwrap();
                model.insert(0, value);
            }
            Command::RemoveAt { pos } => {
                if pos < model.len() {
                    let before = list.get(pos);
                    let removed = list.remove_at(pos);
                    assert_eq!(removed, before);
                    assert_eq!(removed, Ok(model.remove(pos)));
                } else {
                    assert_eq!(list.remove_at(pos), Err(Error::OutOfRange { pos, len: model.len() }));
                }
            }
            Command::RemoveInRange { pos } => {
                if !model.is_empty() {
                    let pos = pos as usize % model.len();
                    assert_eq!(list.remove_at(pos), Ok(model.remove(pos)));
                }
            }
            Command::Get { pos } => {
                assert_eq!(list.get(pos).ok(), model.get(pos).copied());
            }
            Command::GetInRange { pos } => {
                if !model.is_empty() {
                    let pos = pos as usize % model.len();
                    assert_eq!(list.get(pos), Ok(model[pos]));
                }
            }
            Command::First => {
                assert_eq!(list.first(), model.first().copied());
            }
            Command::Last => {
                assert_eq!(list.last(), model.last().copied());
            }
            Command::Len => {
                assert_eq!(list.len(), model.len());
            }
            Command::IsEmpty => {
                assert_eq!(list.is_empty(), model.is_empty());
            }
            Command::Iter => {
                assert!(list.iter().eq(model.iter().copied()));
                assert_eq!(list.iter().len(), model.len());
            }
            Command::Clear => {
                list.clear();
                model.clear();
                assert_eq!(list.len(), 0);
                assert_eq!(list.block_count(), 0);
            }
            Command::Extend { values } => {
                list.extend(values.iter().copied());
                model.extend(values);
            }
            Command::Clone => {
                let cloned = list.clone();
                cloned.validate_blocks();
                assert_eq!(cloned, list);
            }
            Command::CloneFrom { source } => {
                let mut source_list = TestList::with_block_capacity(capacity).unwrap();
                source_list.extend(source.iter().copied());
                list.clone_from(&source_list);
                model = source;
            }
        }

        assert!(list.block_lens().all(|n| n <= capacity));
        let list_contents: Vec<_> = list.iter().collect();
        assert_eq!(list_contents, model);
    }
    list.validate_blocks();
});

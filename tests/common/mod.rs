//! Shared fixtures: a small object model with inheritance, enums carrying
//! fields and a type without a zero-argument initializer.
#![allow(dead_code)]

use userial::Reflect;

#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct University {
    pub name: String,
    pub accreditation_level: i32,
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct Human {
    pub name: String,
    pub surname: String,
    pub age: i32,
    pub gender: Gender,
}

#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct Student {
    pub faculty_name: String,
    pub university: University,
    #[userial(parent)]
    pub human: Human,
}

/// No `default`: placeholders come from the memberwise initializer.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct House {
    pub address: Option<String>,
    pub number_of_floors: i32,
    pub stone: bool,
}

#[derive(Reflect, Debug, Clone, PartialEq)]
pub enum TestEnum {
    #[userial(rename = "ONE")]
    One {
        title: String,
        value: i32,
        university: Option<University>,
    },
    #[userial(rename = "TWO")]
    Two {
        title: String,
        value: i32,
        university: Option<University>,
    },
    #[userial(rename = "THREE")]
    Three {
        title: String,
        value: i32,
        university: Option<University>,
    },
}

pub fn bsu() -> University {
    University {
        name: "BSU".into(),
        accreditation_level: 4,
    }
}

pub fn student() -> Student {
    Student {
        faculty_name: "FPM".into(),
        university: bsu(),
        human: Human {
            name: "Ivan".into(),
            surname: "Petrov".into(),
            age: 21,
            gender: Gender::Male,
        },
    }
}

pub fn one() -> TestEnum {
    TestEnum::One {
        title: "Один".into(),
        value: 1,
        university: Some(bsu()),
    }
}

pub fn two() -> TestEnum {
    TestEnum::Two {
        title: "Два".into(),
        value: 2,
        university: None,
    }
}

/// Length-prefixed UTF-8, as it appears on the wire.
pub fn utf(s: &str) -> Vec<u8> {
    let mut out = (s.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    out
}

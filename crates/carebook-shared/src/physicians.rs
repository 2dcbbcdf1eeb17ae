use serde::Serialize;

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  PartialEq,
  Eq,
)]
pub struct Physician {
  pub name:  &'static str,
  pub image: &'static str
}

pub const PHYSICIANS: &[Physician] = &[
  Physician {
    name:  "John Green",
    image: "/assets/images/dr-green.svg"
  },
  Physician {
    name:  "Leila Cameron",
    image:
      "/assets/images/dr-cameron.svg"
  },
  Physician {
    name:  "David Livingston",
    image:
      "/assets/images/dr-livingston.svg"
  },
  Physician {
    name:  "Evan Peter",
    image: "/assets/images/dr-peter.svg"
  },
  Physician {
    name:  "Jane Powell",
    image:
      "/assets/images/dr-powell.svg"
  },
  Physician {
    name:  "Alex Ramirez",
    image: "/assets/images/dr-ramirez.svg"
  },
  Physician {
    name:  "Jasmine Lee",
    image: "/assets/images/dr-lee.svg"
  },
  Physician {
    name:  "Alyana Cruz",
    image: "/assets/images/dr-cruz.svg"
  },
  Physician {
    name:  "Hardik Sharma",
    image:
      "/assets/images/dr-sharma.svg"
  }
];

/// Case-insensitive lookup by display
/// name.
pub fn find_physician(
  name: &str
) -> Option<&'static Physician> {
  let wanted = name.trim();
  PHYSICIANS.iter().find(|physician| {
    physician
      .name
      .eq_ignore_ascii_case(wanted)
  })
}

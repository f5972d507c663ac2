//! Renders a [`Normal`] term to text, writing straight to any `io::Write`
//! sink and covering the stuck-primitive atoms `Normal` can produce in
//! addition to ordinary lambda terms.

use std::io::{self, Write};

use crate::term::Normal;

pub fn print(sink: &mut impl Write, term: &Normal) -> io::Result<()> {
    match term {
        Normal::Var(i) => write!(sink, "{i}"),
        Normal::Lam(body) => {
            write!(sink, "(\u{3bb} ")?;
            print(sink, body)?;
            write!(sink, ")")
        }
        Normal::App(f, a) => {
            write!(sink, "(")?;
            print(sink, f)?;
            write!(sink, " ")?;
            print(sink, a)?;
            write!(sink, ")")
        }
        Normal::Cell(v) => write!(sink, "cell[{v}]"),
        Normal::StuckUop => write!(sink, "<uop>"),
        Normal::StuckBop => write!(sink, "<bop>"),
        Normal::StuckIf => write!(sink, "<if>"),
        Normal::StuckFix => write!(sink, "<fix>"),
    }
}

pub fn print_to_string(term: &Normal) -> String {
    let mut buf = Vec::new();
    print(&mut buf, term).expect("writing to a Vec<u8> never fails");
    String::from_utf8(buf).expect("printer only ever emits ASCII/UTF-8 literals")
}

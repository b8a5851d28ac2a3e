//! Gmail-shaped page fragments shared by unit tests.

use crate::dom::Element;

pub fn view_message(subject: &str, body: &str) -> Element {
    Element::new("div")
        .class("adn")
        .class("ads")
        .child(
            Element::new("div")
                .class("ha")
                .child(Element::new("h2").text(subject)),
        )
        .child(
            Element::new("div")
                .class("a3s")
                .class("aiL")
                .child(Element::new("div").text(body)),
        )
}

pub fn editor(text: &str) -> Element {
    Element::new("div")
        .attr("role", "textbox")
        .attr("contenteditable", "true")
        .text(text)
}

pub fn compose_window(subject: &str, body: &str) -> Element {
    Element::new("div").class("M9").child(
        Element::new("div")
            .class("AD")
            .child(
                Element::new("input")
                    .attr("name", "subjectbox")
                    .attr("value", subject),
            )
            .child(editor(body)),
    )
}

pub fn reply_box(draft: &str) -> Element {
    Element::new("div").class("ip").class("iq").child(editor(draft))
}

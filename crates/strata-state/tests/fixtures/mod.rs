//! Shared domain fixtures for the store integration tests: a small bookshop
//! and a recursive node tree.

use std::sync::OnceLock;
use strata_state::{
    action, persistent, simple_action, Action, ActionDef, Coll, Cursor, Field, KeyMapper,
    Persistent, StrataResult, TypeDef,
};

persistent!(pub struct Publisher);
persistent!(pub struct ForeignPublisher);
persistent!(pub struct Book);
persistent!(pub struct Shelf);
persistent!(pub struct Node);

// ============================================================================
// Publisher
// ============================================================================

pub struct PublisherProps {
    pub name: Field<String>,
    pub reputation: Field<i64>,
    pub upvote: ActionDef<()>,
    pub downvote: ActionDef<()>,
}

pub fn publisher_def() -> &'static TypeDef<PublisherProps> {
    static DEF: OnceLock<TypeDef<PublisherProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::define("Publisher", |b| PublisherProps {
            name: b.field("name"),
            reputation: b.field_with("reputation", 3i64),
            upvote: b.action(
                "upvote",
                simple_action(|p: &Publisher| p.with_reputation((p.reputation() + 1).min(5))),
            ),
            downvote: b.action(
                "downvote",
                simple_action(|p: &Publisher| p.with_reputation((p.reputation() - 1).max(1))),
            ),
        })
    })
}

impl Publisher {
    pub fn new() -> Self {
        Self::from_record(publisher_def().record())
    }

    pub fn name(&self) -> Option<String> {
        publisher_def().props().name.get(self.record())
    }

    pub fn with_name(&self, name: &str) -> Self {
        Self::from_record(
            publisher_def()
                .props()
                .name
                .set(self.record(), name.to_string()),
        )
    }

    pub fn reputation(&self) -> i64 {
        publisher_def()
            .props()
            .reputation
            .get(self.record())
            .unwrap_or(3)
    }

    pub fn with_reputation(&self, reputation: i64) -> Self {
        Self::from_record(
            publisher_def()
                .props()
                .reputation
                .set(self.record(), reputation),
        )
    }

    pub fn upvote() -> Action {
        publisher_def().props().upvote.make()
    }

    pub fn downvote() -> Action {
        publisher_def().props().downvote.make()
    }
}

// ============================================================================
// ForeignPublisher: votes run the other way round
// ============================================================================

pub struct ForeignPublisherProps {
    pub upvote: ActionDef<()>,
    pub downvote: ActionDef<()>,
}

pub fn foreign_publisher_def() -> &'static TypeDef<ForeignPublisherProps> {
    static DEF: OnceLock<TypeDef<ForeignPublisherProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::extend("ForeignPublisher", publisher_def(), |b| {
            ForeignPublisherProps {
                upvote: b.action("upvote", publisher_def().props().downvote.clone()),
                downvote: b.action("downvote", publisher_def().props().upvote.clone()),
            }
        })
    })
}

impl ForeignPublisher {
    pub fn new() -> Self {
        Self::from_record(foreign_publisher_def().record())
    }

    pub fn as_publisher(self) -> Publisher {
        Publisher::from_record(self.into_record())
    }
}

// ============================================================================
// Book
// ============================================================================

#[derive(Clone)]
pub struct TitleAndPrice {
    pub title: String,
    pub price: f64,
}

pub struct BookProps {
    pub title: Field<String>,
    pub price: Field<f64>,
    pub publisher: Field<Publisher>,
    pub set_title_and_price: ActionDef<TitleAndPrice>,
    pub publish: ActionDef<String>,
    pub publish_overseas: ActionDef<String>,
}

pub fn book_def() -> &'static TypeDef<BookProps> {
    static DEF: OnceLock<TypeDef<BookProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::define("Book", |b| BookProps {
            title: b.field("title"),
            price: b.field("price"),
            publisher: b.field_with("publisher", Publisher::new()),
            set_title_and_price: b.action(
                "set_title_and_price",
                action(|book: &Book, t: &TitleAndPrice| {
                    book.with_title(&t.title).with_price(t.price)
                }),
            ),
            publish: b.action(
                "publish",
                action(|book: &Book, name: &String| {
                    book.with_publisher(Publisher::new().with_name(name))
                }),
            ),
            publish_overseas: b.action(
                "publish_overseas",
                action(|book: &Book, name: &String| {
                    book.with_publisher(ForeignPublisher::new().as_publisher().with_name(name))
                }),
            ),
        })
    })
}

impl Book {
    pub fn new() -> Self {
        Self::from_record(book_def().record())
    }

    pub fn title(&self) -> Option<String> {
        book_def().props().title.get(self.record())
    }

    pub fn with_title(&self, title: &str) -> Self {
        Self::from_record(book_def().props().title.set(self.record(), title.to_string()))
    }

    pub fn price(&self) -> Option<f64> {
        book_def().props().price.get(self.record())
    }

    pub fn with_price(&self, price: f64) -> Self {
        Self::from_record(book_def().props().price.set(self.record(), price))
    }

    pub fn publisher(&self) -> Option<Publisher> {
        book_def().props().publisher.get(self.record())
    }

    pub fn with_publisher(&self, publisher: Publisher) -> Self {
        Self::from_record(book_def().props().publisher.set(self.record(), publisher))
    }

    pub fn set_title_and_price(title: &str, price: f64) -> Action {
        book_def().props().set_title_and_price.of(TitleAndPrice {
            title: title.to_string(),
            price,
        })
    }

    pub fn publish(name: &str) -> Action {
        book_def().props().publish.of(name.to_string())
    }

    pub fn publish_overseas(name: &str) -> Action {
        book_def().props().publish_overseas.of(name.to_string())
    }
}

// ============================================================================
// Shelf
// ============================================================================

pub struct ShelfProps {
    pub books: Coll<Book>,
    pub add_book: ActionDef<u64>,
}

pub fn shelf_def() -> &'static TypeDef<ShelfProps> {
    static DEF: OnceLock<TypeDef<ShelfProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::define("Shelf", |b| {
            let books = b.collection::<Book, _>("books", KeyMapper);
            let handle = books.clone();
            let add_book = b.action(
                "add_book",
                action(move |shelf: &Shelf, id: &u64| {
                    Shelf::from_record(handle.put(shelf.record(), *id, Book::new()))
                }),
            );
            ShelfProps { books, add_book }
        })
    })
}

impl Shelf {
    pub fn new() -> Self {
        Self::from_record(shelf_def().record())
    }

    pub fn book(&self, id: u64) -> Option<Book> {
        shelf_def().props().books.at(self.record(), id)
    }

    pub fn add_book(id: u64) -> Action {
        shelf_def().props().add_book.of(id)
    }
}

// ============================================================================
// Node: a recursive tree whose children default to empty nodes
// ============================================================================

pub struct NodeProps {
    pub value: Field<String>,
    pub children: Coll<Node>,
    pub set_value: ActionDef<String>,
}

pub fn node_def() -> &'static TypeDef<NodeProps> {
    static DEF: OnceLock<TypeDef<NodeProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::define("Node", |b| NodeProps {
            value: b.field("value"),
            children: b.collection_of("children", KeyMapper, Node::new),
            set_value: b.action(
                "set_value",
                action(|node: &Node, value: &String| node.with_value(value)),
            ),
        })
    })
}

impl Node {
    pub fn new() -> Self {
        Self::from_record(node_def().record())
    }

    pub fn value(&self) -> Option<String> {
        node_def().props().value.get(self.record())
    }

    pub fn with_value(&self, value: &str) -> Self {
        Self::from_record(node_def().props().value.set(self.record(), value.to_string()))
    }

    pub fn set_value(value: &str) -> Action {
        node_def().props().set_value.of(value.to_string())
    }

    /// Bind a cursor along a path of child keys, one item cursor per step.
    /// Binding alone makes no updates; absent steps resolve to the default
    /// child node until an action materializes them.
    pub fn bind_path(cursor: Cursor<Node>, path: &[&str]) -> StrataResult<Cursor<Node>> {
        match path.split_first() {
            None => Ok(cursor),
            Some((head, rest)) => {
                let child = node_def().props().children.item(&cursor, *head)?;
                Node::bind_path(child, rest)
            }
        }
    }
}

mod fanout;
mod support;

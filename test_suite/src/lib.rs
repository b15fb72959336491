mod dynamic;
mod filtering;
mod filterset;
mod forms;
mod group;
mod lookups;
mod memory;
mod schema;
